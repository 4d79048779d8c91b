use crate::domain::phone_number::PhoneNumber;
use crate::domain::submitter_email::SubmitterEmail;
use crate::domain::submitter_name::SubmitterName;
use crate::domain::validation::{bounded_field, ValidationError};

/// Raw fields of one `POST /event-submit`.
#[derive(serde::Deserialize)]
pub struct EventForm {
    #[serde(default)]
    pub event_title: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "_honey")]
    pub honey: String,
}

impl EventForm {
    pub fn tripped_honeypot(&self) -> bool {
        !self.honey.trim().is_empty()
    }
}

/// An event registration that has passed every validation rule.
#[derive(Debug)]
pub struct EventSubmission {
    pub event_title: String,
    pub event_type: String,
    pub event_id: String,
    pub name: SubmitterName,
    pub email: SubmitterEmail,
    pub phone: Option<PhoneNumber>,
    pub company: String,
    pub designation: String,
    pub message: String,
}

impl TryFrom<EventForm> for EventSubmission {
    type Error = ValidationError;

    fn try_from(form: EventForm) -> Result<Self, Self::Error> {
        let event_title = bounded_field(
            "event_title",
            &form.event_title,
            3,
            200,
            "Please select a valid event.",
        )?;
        let name = SubmitterName::parse(&form.name)?;
        let email = SubmitterEmail::parse(&form.email)?;
        let phone = PhoneNumber::parse(&form.phone)?;
        let company = bounded_field("company", &form.company, 0, 120, "Company name is too long.")?;
        let designation = bounded_field(
            "designation",
            &form.designation,
            0,
            120,
            "Designation is too long.",
        )?;
        let event_type = bounded_field("event_type", &form.event_type, 0, 80, "Event type is too long.")?;
        let event_id = bounded_field("event_id", &form.event_id, 0, 100, "Event id is too long.")?;
        let message = bounded_field("message", &form.message, 0, 5000, "Message is too long.")?;
        Ok(Self {
            event_title,
            event_type,
            event_id,
            name,
            email,
            phone,
            company,
            designation,
            message,
        })
    }
}
