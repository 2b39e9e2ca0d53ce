use thiserror::Error;

/// Longest task text accepted, in characters after trimming.
pub const MAX_TEXT_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a task!")]
    Empty,
    #[error("Task is too long! Please keep it under {max} characters.")]
    TooLong { len: usize, max: usize },
}

/// Validate task text: trimmed, non-empty, at most [`MAX_TEXT_LEN`] characters.
/// Returns the trimmed text on success.
pub fn validate_text(raw: &str) -> Result<String, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = text.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            len,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(text.to_string())
}
