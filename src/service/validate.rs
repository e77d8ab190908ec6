//! Input checks shared by the public submission forms.

use crate::error::AppError;

/// Longest accepted author display name, in characters
pub const MAX_NAME_CHARS: usize = 100;

/// Trim a required text field, rejecting blanks.
pub fn required(field: &'static str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Reject values longer than `max` characters.
pub fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Trim and check an email address.
///
/// Only the shape is checked: one `@` with a non-empty local part and
/// domain, and no whitespace.
pub fn email(value: &str) -> Result<String, AppError> {
    let trimmed = required("Email", value)?;
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(
            "Email must be a valid email address".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Check that a URL is absolute http(s).
pub fn http_url(field: &'static str, value: &str) -> Result<String, AppError> {
    let trimmed = required(field, value)?;
    let parsed = url::Url::parse(&trimmed)
        .map_err(|_| AppError::Validation(format!("{field} must be a valid URL")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "{field} must use http or https"
        )));
    }
    Ok(trimmed)
}
