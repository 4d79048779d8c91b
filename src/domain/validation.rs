/// Validation stops at the first violated rule; the message is safe to show
/// the caller verbatim.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn clean_input(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a free-text field and check its length in characters.
pub(crate) fn bounded_field(
    field: &'static str,
    raw: &str,
    min: usize,
    max: usize,
    message: &'static str,
) -> Result<String, ValidationError> {
    let cleaned = clean_input(raw);
    let length = cleaned.chars().count();
    if length < min || length > max {
        return Err(ValidationError::new(field, message));
    }
    Ok(cleaned)
}
