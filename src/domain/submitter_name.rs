use crate::domain::validation::{clean_input, ValidationError};

#[derive(Debug, Clone)]
pub struct SubmitterName(String);

impl SubmitterName {
    /// Normalizes and checks the submitter's name: 2 to 100 characters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let cleaned = clean_input(raw);
        let length = cleaned.chars().count();
        if !(2..=100).contains(&length) {
            return Err(ValidationError::new("name", "Please enter a valid name."));
        }
        Ok(Self(cleaned))
    }
}

impl AsRef<str> for SubmitterName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
