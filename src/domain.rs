mod contact;
mod event;
mod phone_number;
mod submitter_email;
mod submitter_name;
mod validation;

pub use contact::{ContactForm, ContactSubmission};
pub use event::{EventForm, EventSubmission};
pub use phone_number::PhoneNumber;
pub use submitter_email::SubmitterEmail;
pub use submitter_name::SubmitterName;
pub use validation::{clean_input, ValidationError};

/// The two submission kinds the relay handles. Each has its own field set,
/// routing defaults and rate-limit budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Contact,
    Event,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Contact => "contact",
            Flow::Event => "event",
        }
    }

    /// What the caller called the thing they submitted; used in the
    /// user-facing upstream-failure message.
    pub fn submission_noun(&self) -> &'static str {
        match self {
            Flow::Contact => "message",
            Flow::Event => "registration",
        }
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
