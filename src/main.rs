use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use form_relay::configuration::get_configuration;
use form_relay::email_client::MailClient;
use form_relay::observability::TracingOpsSink;
use form_relay::rate_limit::{FileStore, SlidingWindow};
use form_relay::startup::run;
use form_relay::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber("form-relay".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = get_configuration().expect("Failed to read config file");
    let address = format!(
        "{address}:{port}",
        address = config.application.host,
        port = config.application.port
    );
    let listener = TcpListener::bind(address)?;

    let mail_client = MailClient::from_settings(&config.mail, Duration::from_secs(20));
    let store_dir = config
        .rate_limit
        .store_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("form-relay-rate-limit"));
    let rate_limiter = SlidingWindow::new(
        Arc::new(FileStore::new(store_dir)),
        config.rate_limit.window_seconds,
        config.rate_limit.max_requests,
    );

    run(
        listener,
        config,
        mail_client,
        rate_limiter,
        Arc::new(TracingOpsSink),
    )?
    .await
}
