use crate::domain::validation::{clean_input, ValidationError};

#[derive(Debug, Clone)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses the optional phone field; `None` when it was left blank.
    /// Accepts digits, `+`, `-`, parentheses and spaces, 7 to 30 characters.
    pub fn parse(raw: &str) -> Result<Option<Self>, ValidationError> {
        let cleaned = clean_input(raw);
        if cleaned.is_empty() {
            return Ok(None);
        }
        let length = cleaned.chars().count();
        let allowed = cleaned
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '(' | ')'));
        if !allowed || !(7..=30).contains(&length) {
            return Err(ValidationError::new(
                "phone",
                "Please enter a valid phone number.",
            ));
        }
        Ok(Some(Self(cleaned)))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
