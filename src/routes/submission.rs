use std::fmt::Formatter;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};

use crate::domain::{Flow, ValidationError};

/// The one body shape every terminal state renders.
#[derive(serde::Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
        }
    }
}

#[derive(thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Too many submissions from this network. Please try again in a few minutes.")]
    RateLimited,
    /// The offending key stays in the source chain for operators; callers
    /// only learn that configuration is incomplete.
    #[error("Server configuration is incomplete.")]
    Misconfigured(#[source] anyhow::Error),
    #[error("Unable to submit your {} right now.", .flow.submission_noun())]
    Upstream {
        flow: Flow,
        #[source]
        cause: anyhow::Error,
    },
}

impl std::fmt::Debug for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubmitError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubmitError::Validation(_) => StatusCode::BAD_REQUEST,
            SubmitError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SubmitError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SubmitError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::failure(self.to_string()))
    }
}

/// Catch-all for the submit resources so non-POST callers get the JSON
/// contract instead of the framework default.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ApiResponse::failure("Method not allowed.".into()))
}

/// Best client network address available to the server; reverse-proxy
/// headers are honored through actix's connection info. A socket address is
/// reduced to its IP so one client maps to one rate-limit key.
pub fn client_address(request: &HttpRequest) -> String {
    let info = request.connection_info();
    let addr = info.realip_remote_addr().unwrap_or("unknown");
    match addr.parse::<std::net::SocketAddr>() {
        Ok(socket) => socket.ip().to_string(),
        Err(_) => addr.to_string(),
    }
}

pub(crate) fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
