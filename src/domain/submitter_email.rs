use crate::domain::validation::{clean_input, ValidationError};

#[derive(Debug, Clone)]
pub struct SubmitterEmail(String);

impl SubmitterEmail {
    /// Normalizes and checks the reply address: standard email grammar,
    /// at most 200 characters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let cleaned = clean_input(raw);
        if cleaned.chars().count() > 200 || !validator::validate_email(&cleaned) {
            return Err(ValidationError::new(
                "email",
                "Please enter a valid email address.",
            ));
        }
        Ok(Self(cleaned))
    }
}

impl AsRef<str> for SubmitterEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubmitterEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
