use regex::Regex;
use std::sync::LazyLock;

use super::ApiError;
use crate::domain::schedule::MAX_FREQUENCY_DAYS;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

static IMAGE_URL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(https?://.+|data:image/(jpeg|jpg|png|gif|webp);base64,.+)$").ok()
});

const MAX_NAME_LENGTH: usize = 100;

pub fn validate_id(id: i32, resource: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim();
    let valid = EMAIL_RE.as_ref().is_some_and(|re| re.is_match(trimmed));
    if !valid {
        return Err(ApiError::validation("Please enter a valid email address"));
    }
    Ok(trimmed.to_lowercase())
}

pub fn validate_password(password: &str, min_length: usize) -> Result<&str, ApiError> {
    if password.len() < min_length {
        return Err(ApiError::validation(format!(
            "Password must be at least {min_length} characters"
        )));
    }
    Ok(password)
}

/// Non-empty after trimming and at most 100 characters.
pub fn validate_name<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::validation(format!(
            "{field} must be {MAX_NAME_LENGTH} characters or less"
        )));
    }
    Ok(trimmed)
}

pub fn validate_amount(amount_ml: i32) -> Result<i32, ApiError> {
    if amount_ml < 1 {
        return Err(ApiError::validation("Water amount must be at least 1 ml"));
    }
    Ok(amount_ml)
}

pub fn validate_frequency(days: i32) -> Result<i32, ApiError> {
    let max = i32::try_from(MAX_FREQUENCY_DAYS).unwrap_or(i32::MAX);
    if !(1..=max).contains(&days) {
        return Err(ApiError::validation(format!(
            "Watering frequency must be between 1 and {max} days"
        )));
    }
    Ok(days)
}

/// Accepts http(s) URLs and base64 `data:image/...` URIs.
pub fn validate_image_url(url: &str) -> Result<&str, ApiError> {
    let valid = IMAGE_URL_RE.as_ref().is_some_and(|re| re.is_match(url));
    if !valid {
        return Err(ApiError::validation(
            "Image URL must be an http(s) URL or a base64 data:image URI",
        ));
    }
    Ok(url)
}

pub fn validate_days(days: u32) -> Result<u32, ApiError> {
    if !(1..=MAX_FREQUENCY_DAYS).contains(&days) {
        return Err(ApiError::validation(format!(
            "Invalid days: {days}. Days must be between 1 and {MAX_FREQUENCY_DAYS}"
        )));
    }
    Ok(days)
}
