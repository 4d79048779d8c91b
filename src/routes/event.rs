use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::configuration::{is_placeholder, AckSettings, Settings};
use crate::domain::{EventForm, EventSubmission, Flow};
use crate::email_client::{AccessToken, MailClient, MailPayload};
use crate::observability::{OpsEvent, OpsSink, UpstreamStage};
use crate::rate_limit::{Admission, SlidingWindow};
use crate::routes::submission::{client_address, or_na, ApiResponse, SubmitError};

const DEFAULT_ACK_SUBJECT: &str = "Registration received - {{event_title}}";

#[tracing::instrument(
    name = "Handling an event registration",
    skip(form, request, settings, mail_client, rate_limiter, ops),
    fields(client = tracing::field::Empty, event = tracing::field::Empty)
)]
pub async fn submit_event(
    form: web::Form<EventForm>,
    request: HttpRequest,
    settings: web::Data<Settings>,
    mail_client: web::Data<MailClient>,
    rate_limiter: web::Data<SlidingWindow>,
    ops: web::Data<Arc<dyn OpsSink>>,
) -> Result<HttpResponse, SubmitError> {
    settings
        .mail
        .ensure_serviceable(Flow::Event)
        .map_err(SubmitError::Misconfigured)?;

    if form.tripped_honeypot() {
        tracing::info!("honeypot tripped; dropping registration silently");
        return Ok(HttpResponse::Ok().json(ApiResponse::accepted()));
    }

    let submission: EventSubmission = form.into_inner().try_into()?;
    tracing::Span::current().record("event", &tracing::field::display(&submission.event_title));

    let client = client_address(&request);
    tracing::Span::current().record("client", &tracing::field::display(&client));

    if rate_limiter.admit(&client, Flow::Event) == Admission::Limited {
        return Err(SubmitError::RateLimited);
    }

    let token = match mail_client.acquire_access_token().await {
        Some(token) => token,
        None => {
            ops.record(OpsEvent::UpstreamFailure {
                flow: Flow::Event,
                stage: UpstreamStage::Token,
                detail: "no access token issued".into(),
            });
            return Err(SubmitError::Upstream {
                flow: Flow::Event,
                cause: anyhow::anyhow!("token acquisition failed"),
            });
        }
    };

    let routing = settings.mail.routing(Flow::Event);
    let payload = MailPayload::plaintext(
        &routing.from_address,
        &routing.to_address,
        &routing.cc_address,
        format!("Event Registration: {}", submission.event_title),
        notification_body(&submission, &client),
    );
    if let Err(error) = mail_client.send_mail(&token, &payload).await {
        ops.record(OpsEvent::UpstreamFailure {
            flow: Flow::Event,
            stage: UpstreamStage::Dispatch,
            detail: error.to_string(),
        });
        return Err(SubmitError::Upstream {
            flow: Flow::Event,
            cause: error.into(),
        });
    }

    acknowledge(
        &submission,
        &routing.acknowledgement,
        &token,
        mail_client.get_ref(),
        ops.get_ref(),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::accepted()))
}

/// Best-effort confirmation to the registrant, mirroring the contact flow.
/// The subject template substitutes `{{event_title}}`.
async fn acknowledge(
    submission: &EventSubmission,
    ack: &AckSettings,
    token: &AccessToken,
    mail_client: &MailClient,
    ops: &Arc<dyn OpsSink>,
) {
    if !ack.enabled {
        ops.record(OpsEvent::AcknowledgementSkipped {
            flow: Flow::Event,
            reason: "disabled by configuration",
        });
        return;
    }
    let from_address = ack.from_address.trim();
    if from_address.is_empty() || is_placeholder(from_address) {
        ops.record(OpsEvent::AcknowledgementSkipped {
            flow: Flow::Event,
            reason: "sender address not configured",
        });
        return;
    }
    let template = match ack.subject.trim() {
        "" => DEFAULT_ACK_SUBJECT,
        subject => subject,
    };
    let subject = template.replace("{{event_title}}", &submission.event_title);
    let payload = MailPayload::plaintext(
        from_address,
        submission.email.as_ref(),
        "",
        subject,
        acknowledgement_body(submission),
    );
    if let Err(error) = mail_client.send_mail(token, &payload).await {
        ops.record(OpsEvent::AcknowledgementFailed {
            flow: Flow::Event,
            detail: error.to_string(),
        });
    }
}

fn notification_body(submission: &EventSubmission, client: &str) -> String {
    let phone = submission
        .phone
        .as_ref()
        .map(AsRef::as_ref)
        .unwrap_or_default();
    [
        "New event registration".to_string(),
        String::new(),
        format!("Event: {}", submission.event_title),
        format!("Event Type: {}", or_na(&submission.event_type)),
        format!("Event ID: {}", or_na(&submission.event_id)),
        String::new(),
        format!("Name: {}", submission.name.as_ref()),
        format!("Email: {}", submission.email.as_ref()),
        format!("Phone: {}", or_na(phone)),
        format!("Company: {}", or_na(&submission.company)),
        format!("Designation: {}", or_na(&submission.designation)),
        String::new(),
        "Special Requirements / Questions:".to_string(),
        or_na(&submission.message).to_string(),
        String::new(),
        format!("IP: {}", client),
        format!(
            "Submitted At (UTC): {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S")
        ),
    ]
    .join("\n")
}

fn acknowledgement_body(submission: &EventSubmission) -> String {
    [
        format!("Dear {},", submission.name.as_ref()),
        String::new(),
        format!(
            "Thank you for registering for \"{}\".",
            submission.event_title
        ),
        "We have received your registration and will confirm the details shortly.".to_string(),
        String::new(),
        "Best regards,".to_string(),
        "The events team".to_string(),
    ]
    .join("\n")
}
