use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::configuration::{is_placeholder, AckSettings, Settings};
use crate::domain::{ContactForm, ContactSubmission, Flow};
use crate::email_client::{AccessToken, MailClient, MailPayload};
use crate::observability::{OpsEvent, OpsSink, UpstreamStage};
use crate::rate_limit::{Admission, SlidingWindow};
use crate::routes::submission::{client_address, or_na, ApiResponse, SubmitError};

const DEFAULT_ACK_SUBJECT: &str = "Thank you for contacting us";

#[tracing::instrument(
    name = "Handling a contact submission",
    skip(form, request, settings, mail_client, rate_limiter, ops),
    fields(client = tracing::field::Empty)
)]
pub async fn submit_contact(
    form: web::Form<ContactForm>,
    request: HttpRequest,
    settings: web::Data<Settings>,
    mail_client: web::Data<MailClient>,
    rate_limiter: web::Data<SlidingWindow>,
    ops: web::Data<Arc<dyn OpsSink>>,
) -> Result<HttpResponse, SubmitError> {
    settings
        .mail
        .ensure_serviceable(Flow::Contact)
        .map_err(SubmitError::Misconfigured)?;

    if form.tripped_honeypot() {
        // Bots get a success response and no mail, denying them any signal.
        tracing::info!("honeypot tripped; dropping submission silently");
        return Ok(HttpResponse::Ok().json(ApiResponse::accepted()));
    }

    let submission: ContactSubmission = form.into_inner().try_into()?;

    let client = client_address(&request);
    tracing::Span::current().record("client", &tracing::field::display(&client));

    if rate_limiter.admit(&client, Flow::Contact) == Admission::Limited {
        return Err(SubmitError::RateLimited);
    }

    let token = match mail_client.acquire_access_token().await {
        Some(token) => token,
        None => {
            ops.record(OpsEvent::UpstreamFailure {
                flow: Flow::Contact,
                stage: UpstreamStage::Token,
                detail: "no access token issued".into(),
            });
            return Err(SubmitError::Upstream {
                flow: Flow::Contact,
                cause: anyhow::anyhow!("token acquisition failed"),
            });
        }
    };

    let routing = settings.mail.routing(Flow::Contact);
    let payload = MailPayload::plaintext(
        &routing.from_address,
        &routing.to_address,
        &routing.cc_address,
        format!("Website Contact: {}", submission.subject),
        notification_body(&submission, &client),
    );
    if let Err(error) = mail_client.send_mail(&token, &payload).await {
        ops.record(OpsEvent::UpstreamFailure {
            flow: Flow::Contact,
            stage: UpstreamStage::Dispatch,
            detail: error.to_string(),
        });
        return Err(SubmitError::Upstream {
            flow: Flow::Contact,
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

/// Best-effort courtesy reply to the submitter. The caller's response is
/// already decided; failure and skips only reach the operator sink.
async fn acknowledge(
    submission: &ContactSubmission,
    ack: &AckSettings,
    token: &AccessToken,
    mail_client: &MailClient,
    ops: &Arc<dyn OpsSink>,
) {
    if !ack.enabled {
        ops.record(OpsEvent::AcknowledgementSkipped {
            flow: Flow::Contact,
            reason: "disabled by configuration",
        });
        return;
    }
    let from_address = ack.from_address.trim();
    if from_address.is_empty() || is_placeholder(from_address) {
        ops.record(OpsEvent::AcknowledgementSkipped {
            flow: Flow::Contact,
            reason: "sender address not configured",
        });
        return;
    }
    let subject = match ack.subject.trim() {
        "" => DEFAULT_ACK_SUBJECT,
        subject => subject,
    };
    let payload = MailPayload::plaintext(
        from_address,
        submission.email.as_ref(),
        "",
        subject.to_string(),
        acknowledgement_body(submission),
    );
    if let Err(error) = mail_client.send_mail(token, &payload).await {
        ops.record(OpsEvent::AcknowledgementFailed {
            flow: Flow::Contact,
            detail: error.to_string(),
        });
    }
}

fn notification_body(submission: &ContactSubmission, client: &str) -> String {
    let phone = submission
        .phone
        .as_ref()
        .map(AsRef::as_ref)
        .unwrap_or_default();
    [
        "New contact form submission".to_string(),
        String::new(),
        format!("Name: {}", submission.name.as_ref()),
        format!("Email: {}", submission.email.as_ref()),
        format!("Phone: {}", or_na(phone)),
        format!("Company: {}", or_na(&submission.company)),
        format!("Subject: {}", submission.subject),
        String::new(),
        "Message:".to_string(),
        submission.message.clone(),
        String::new(),
        format!("IP: {}", client),
        format!(
            "Submitted At (UTC): {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S")
        ),
    ]
    .join("\n")
}

fn acknowledgement_body(submission: &ContactSubmission) -> String {
    [
        format!("Dear {},", submission.name.as_ref()),
        String::new(),
        "Thank you for contacting us.".to_string(),
        "We have received your message and appreciate your interest.".to_string(),
        String::new(),
        format!(
            "Our team will review your enquiry regarding \"{}\" and get back to you shortly.",
            submission.subject
        ),
        String::new(),
        "Best regards,".to_string(),
        "The team".to_string(),
    ]
    .join("\n")
}
