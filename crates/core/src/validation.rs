//! Input validation rules for account and chat fields.
//!
//! Every check returns `Err(CoreError::Validation)` with a message naming the
//! offending field, so handlers can surface it unchanged as a 400 response.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use validator::ValidateEmail;

use crate::error::CoreError;

/// Usernames are 3-20 ASCII letters or digits.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{3,20}$").expect("valid regex"));

/// Optional leading `+`, then 7-15 digits.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid regex"));

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 64;
pub const FULL_NAME_MAX_LENGTH: usize = 50;
pub const EMAIL_MAX_LENGTH: usize = 50;
pub const CHAT_TITLE_MAX_LENGTH: usize = 50;
pub const CHAT_DESCRIPTION_MAX_LENGTH: usize = 100;

pub fn validate_username(username: &str) -> Result<(), CoreError> {
    if !USERNAME_RE.is_match(username) {
        return Err(CoreError::Validation(
            "username must be between 3 and 20 characters and contain only letters and digits"
                .into(),
        ));
    }
    Ok(())
}

/// Passwords need 8-64 characters with at least one letter and one digit.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "password must be between {PASSWORD_MIN_LENGTH} and {PASSWORD_MAX_LENGTH} characters"
        )));
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(CoreError::Validation(
            "password must contain at least one letter and one digit".into(),
        ));
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), CoreError> {
    require_bounded("fullName", full_name, FULL_NAME_MAX_LENGTH)
}

pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if email.chars().count() > EMAIL_MAX_LENGTH {
        return Err(CoreError::Validation(format!(
            "email must be at most {EMAIL_MAX_LENGTH} characters"
        )));
    }
    if !email.validate_email() {
        return Err(CoreError::Validation("email must be a valid address".into()));
    }
    Ok(())
}

pub fn validate_phone_number(phone: &str) -> Result<(), CoreError> {
    if !PHONE_RE.is_match(phone) {
        return Err(CoreError::Validation(
            "phoneNumber must be 7-15 digits with an optional leading '+'".into(),
        ));
    }
    Ok(())
}

/// A birth date may not lie after `today`.
pub fn validate_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Result<(), CoreError> {
    if birth_date > today {
        return Err(CoreError::Validation(
            "birthDate cannot be in the future".into(),
        ));
    }
    Ok(())
}

pub fn validate_chat_title(title: &str) -> Result<(), CoreError> {
    require_bounded("title", title, CHAT_TITLE_MAX_LENGTH)
}

pub fn validate_chat_description(description: &str) -> Result<(), CoreError> {
    if description.chars().count() > CHAT_DESCRIPTION_MAX_LENGTH {
        return Err(CoreError::Validation(format!(
            "description must be at most {CHAT_DESCRIPTION_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Non-blank and at most `max` characters.
fn require_bounded(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}
