use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use secrecy::Secret;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use form_relay::configuration::{get_configuration, Settings};
use form_relay::email_client::MailClient;
use form_relay::observability::{MemoryOpsSink, OpsSink};
use form_relay::rate_limit::{InMemoryStore, RateLimitStore, SlidingWindow};
use form_relay::startup::run;
use form_relay::telemetry::{get_subscriber, init_subscriber};

pub const TOKEN_PATH: &str = "/oauth/v2/token";
pub const MESSAGES_PATH: &str = "/api/accounts/4242/messages";

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub mail_server: MockServer,
    /// Operator-event sink the app under test records into.
    pub ops: Arc<MemoryOpsSink>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_contact(&self, body: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/contact-submit", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_event(&self, body: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/event-submit", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Mount the happy-path token grant.
    pub async fn mount_token_grant(&self) {
        Mock::given(path(TOKEN_PATH))
            .and(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "test-access-token"})),
            )
            .mount(&self.mail_server)
            .await;
    }

    /// Mount a message endpoint that accepts everything, with an expected
    /// call count.
    pub async fn mount_message_accept(&self, expected_calls: u64) {
        Mock::given(path(MESSAGES_PATH))
            .and(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": {"code": 200}})),
            )
            .expect(expected_calls)
            .mount(&self.mail_server)
            .await;
    }

    /// Bodies of every message POSTed to the provider so far, decoded.
    pub async fn sent_messages(&self) -> Vec<serde_json::Value> {
        self.mail_server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|request| request.url.path() == MESSAGES_PATH)
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Settings)) -> TestApp {
    spawn_app_inner(Arc::new(InMemoryStore::new()), customize).await
}

pub async fn spawn_app_with_store(store: Arc<dyn RateLimitStore>) -> TestApp {
    spawn_app_inner(store, |_| {}).await
}

async fn spawn_app_inner(
    store: Arc<dyn RateLimitStore>,
    customize: impl FnOnce(&mut Settings),
) -> TestApp {
    Lazy::force(&TRACING);

    let mail_server = MockServer::start().await;

    let mut config = get_configuration().expect("Failed to read config file");
    config.mail.accounts_base_url = Some(mail_server.uri());
    config.mail.api_base_url = Some(mail_server.uri());
    config.mail.client_id = "test-client-id".into();
    config.mail.client_secret = Secret::new("test-client-secret".into());
    config.mail.refresh_token = Secret::new("test-refresh-token".into());
    config.mail.account_id = "4242".into();
    config.mail.contact.from_address = "relay@example.com".into();
    config.mail.contact.to_address = "inbox@example.com".into();
    config.mail.contact.acknowledgement.from_address = "relay@example.com".into();
    customize(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let mail_client = MailClient::from_settings(&config.mail, Duration::from_secs(5));
    let rate_limiter = SlidingWindow::new(
        store,
        config.rate_limit.window_seconds,
        config.rate_limit.max_requests,
    );
    let ops = Arc::new(MemoryOpsSink::new());
    let ops_sink: Arc<dyn OpsSink> = ops.clone();

    let server =
        run(listener, config, mail_client, rate_limiter, ops_sink).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        mail_server,
        ops,
        api_client: reqwest::Client::new(),
    }
}

pub fn valid_contact_body() -> &'static str {
    "name=Jane%20Doe&email=jane%40example.com&phone=%2B1%20555%20010%200200\
     &company=Acme&subject=Product%20enquiry&message=Could%20you%20tell%20me%20more%3F"
}

pub fn valid_event_body() -> &'static str {
    "event_title=Broadcast%20Expo%202026&event_type=Exhibition&event_id=expo-2026\
     &name=Jane%20Doe&email=jane%40example.com&company=Acme&designation=Engineer"
}
