use std::time::Duration;

use reqwest::header;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

use crate::configuration::MailSettings;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Short-lived bearer credential from the refresh-token grant. Acquired
/// fresh per incoming request, reused only for that request's sends, and
/// never logged or persisted; the secrecy wrapper keeps it redacted in
/// debug output.
#[derive(Debug)]
pub struct AccessToken(Secret<String>);

/// Client for the mail provider's OAuth token and message endpoints.
pub struct MailClient {
    http_client: Client,
    accounts_base_url: String,
    api_base_url: String,
    account_id: String,
    client_id: String,
    client_secret: Secret<String>,
    refresh_token: Secret<String>,
}

impl MailClient {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts_base_url: String,
        api_base_url: String,
        account_id: String,
        client_id: String,
        client_secret: Secret<String>,
        refresh_token: Secret<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .expect("Failed to build the mail provider HTTP client");
        Self {
            http_client,
            accounts_base_url,
            api_base_url,
            account_id,
            client_id,
            client_secret,
            refresh_token,
        }
    }

    /// Build from configuration, deriving the provider endpoints from the
    /// region code unless explicit overrides are set.
    pub fn from_settings(mail: &MailSettings, timeout: Duration) -> Self {
        Self::new(
            mail.accounts_base(),
            mail.api_base(),
            mail.account_id.clone(),
            mail.client_id.clone(),
            mail.client_secret.clone(),
            mail.refresh_token.clone(),
            timeout,
        )
    }

    /// Exchange the long-lived refresh credential for a bearer token.
    ///
    /// Every failure mode collapses to `None` so the orchestrator has a
    /// single error path; the cause is recorded here for operators.
    #[tracing::instrument(name = "Acquiring provider access token", skip(self))]
    pub async fn acquire_access_token(&self) -> Option<AccessToken> {
        let url = format!("{}/oauth/v2/token", self.accounts_base_url);
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("refresh_token", self.refresh_token.expose_secret().as_str()),
        ];
        let response = match self.http_client.post(&url).form(&params).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(error = %error, "token endpoint unreachable");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "token endpoint rejected the refresh grant");
            return None;
        }
        let body: TokenResponse = match response.json().await {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(error = %error, "token endpoint returned an unreadable body");
                return None;
            }
        };
        match body.access_token {
            Some(token) if !token.is_empty() => Some(AccessToken(Secret::new(token))),
            _ => {
                tracing::warn!("token endpoint answered without an access token");
                None
            }
        }
    }

    /// POST one message to the provider. `Err` is a value for the caller's
    /// 502 decision and the operator sink; it is never propagated further.
    #[tracing::instrument(
        name = "Dispatching mail through the provider",
        skip(self, token, payload),
        fields(subject = %payload.subject)
    )]
    pub async fn send_mail(
        &self,
        token: &AccessToken,
        payload: &MailPayload,
    ) -> Result<(), SendError> {
        let url = format!(
            "{}/api/accounts/{}/messages",
            self.api_base_url, self.account_id
        );
        let response = self
            .http_client
            .post(&url)
            .header(
                header::AUTHORIZATION,
                format!("Zoho-oauthtoken {}", token.0.expose_secret()),
            )
            .header(header::ACCEPT, "application/json")
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SendError::RejectedStatus(status));
        }
        let envelope: SendResponse = response
            .json()
            .await
            .map_err(|_| SendError::UnexpectedEnvelope)?;
        if envelope.accepted() {
            Ok(())
        } else {
            Err(SendError::UnexpectedEnvelope)
        }
    }
}

/// A dispatch that did not end with an accepted message.
#[derive(thiserror::Error, Debug)]
pub enum SendError {
    #[error("transport failure calling the mail provider")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected the send with HTTP {0}")]
    RejectedStatus(reqwest::StatusCode),
    #[error("mail provider answered without a recognized success envelope")]
    UnexpectedEnvelope,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// One outbound message in the provider's wire shape.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailPayload {
    pub from_address: String,
    pub to_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_address: Option<String>,
    pub subject: String,
    pub content: String,
    pub mail_format: &'static str,
}

impl MailPayload {
    /// Address lists arrive as comma-separated configuration strings;
    /// padding and empty entries are stripped before they hit the wire.
    pub fn plaintext(
        from_address: &str,
        to_addresses: &str,
        cc_addresses: &str,
        subject: String,
        content: String,
    ) -> Self {
        let cc = join_address_list(cc_addresses);
        Self {
            from_address: from_address.trim().to_string(),
            to_address: join_address_list(to_addresses),
            cc_address: if cc.is_empty() { None } else { Some(cc) },
            subject,
            content,
            mail_format: "plaintext",
        }
    }
}

pub fn join_address_list(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// The provider wraps results differently for single and batch-style sends;
/// either shape can carry the decisive code, anything else is a failure.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SendResponse {
    Status { status: EnvelopeCode },
    DataArray { data: Vec<EnvelopeCode> },
    Unrecognized(serde_json::Value),
}

#[derive(serde::Deserialize)]
struct EnvelopeCode {
    #[serde(default)]
    code: i64,
}

impl SendResponse {
    fn accepted(&self) -> bool {
        match self {
            SendResponse::Status { status } => status.code == 200,
            SendResponse::DataArray { data } => {
                data.first().map(|first| first.code == 200).unwrap_or(false)
            }
            SendResponse::Unrecognized(_) => false,
        }
    }
}
