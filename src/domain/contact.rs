use crate::domain::phone_number::PhoneNumber;
use crate::domain::submitter_email::SubmitterEmail;
use crate::domain::submitter_name::SubmitterName;
use crate::domain::validation::{bounded_field, ValidationError};

/// Raw fields of one `POST /contact-submit`, exactly as the form sent them.
#[derive(serde::Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    /// Hidden trap field; humans never see it, bots fill it in.
    #[serde(default, rename = "_honey")]
    pub honey: String,
}

impl ContactForm {
    pub fn tripped_honeypot(&self) -> bool {
        !self.honey.trim().is_empty()
    }
}

/// A contact submission that has passed every validation rule.
#[derive(Debug)]
pub struct ContactSubmission {
    pub name: SubmitterName,
    pub email: SubmitterEmail,
    pub phone: Option<PhoneNumber>,
    pub company: String,
    pub subject: String,
    pub message: String,
}

impl TryFrom<ContactForm> for ContactSubmission {
    type Error = ValidationError;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        let name = SubmitterName::parse(&form.name)?;
        let email = SubmitterEmail::parse(&form.email)?;
        let phone = PhoneNumber::parse(&form.phone)?;
        let company = bounded_field("company", &form.company, 0, 120, "Company name is too long.")?;
        let subject = bounded_field("subject", &form.subject, 3, 150, "Please enter a valid subject.")?;
        let message = bounded_field("message", &form.message, 5, 5000, "Please enter a valid message.")?;
        Ok(Self {
            name,
            email,
            phone,
            company,
            subject,
            message,
        })
    }
}
