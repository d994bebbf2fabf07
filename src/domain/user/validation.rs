//! User validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use validator::{ValidateEmail, ValidateUrl};

use super::entity::UserProfile;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("User ID is not a valid UUID: '{0}'")]
    InvalidId(String),

    #[error("Email address cannot be empty")]
    EmptyEmail,

    #[error("Email address exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email address '{0}' is not valid")]
    InvalidEmail(String),

    #[error("{field} must be between {min} and {max} characters")]
    NameLength {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{0} must contain letters and spaces only")]
    InvalidNameCharacters(&'static str),

    #[error("{field} must be between {min} and {max} characters")]
    UrlLength {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{0} must be a valid URL")]
    InvalidUrl(&'static str),

    #[error("Comment exceeds maximum length of {0} characters")]
    CommentTooLong(usize),

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),
}

const MAX_EMAIL_LENGTH: usize = 256;
const MIN_NAME_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 35;
const MIN_URL_LENGTH: usize = 3;
const MAX_URL_LENGTH: usize = 1024;
const MAX_COMMENT_LENGTH: usize = 2048;
const MIN_PASSWORD_LENGTH: usize = 7;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Letters (including accented latin), spaces, apostrophes and hyphens
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \x{00C0}-\x{01FF}a-zA-Z'\-]+$").expect("valid name regex"));

/// Normalize an email address: surrounding whitespace removed, lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address (expects a normalized value)
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !email.validate_email() {
        return Err(UserValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

/// Validate a first or last name
///
/// Rules:
/// - Between 3 and 35 characters
/// - Letters, spaces, apostrophes and hyphens only
pub fn validate_name(field: &'static str, name: &str) -> Result<(), UserValidationError> {
    let length = name.chars().count();

    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
        return Err(UserValidationError::NameLength {
            field,
            min: MIN_NAME_LENGTH,
            max: MAX_NAME_LENGTH,
        });
    }

    if !NAME_PATTERN.is_match(name) {
        return Err(UserValidationError::InvalidNameCharacters(field));
    }

    Ok(())
}

/// Validate an optional profile link (GitHub, LinkedIn)
pub fn validate_profile_url(field: &'static str, url: &str) -> Result<(), UserValidationError> {
    if !(MIN_URL_LENGTH..=MAX_URL_LENGTH).contains(&url.len()) {
        return Err(UserValidationError::UrlLength {
            field,
            min: MIN_URL_LENGTH,
            max: MAX_URL_LENGTH,
        });
    }

    if !url.validate_url() {
        return Err(UserValidationError::InvalidUrl(field));
    }

    Ok(())
}

/// Validate a free-form comment
pub fn validate_comment(comment: &str) -> Result<(), UserValidationError> {
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(UserValidationError::CommentTooLong(MAX_COMMENT_LENGTH));
    }

    Ok(())
}

/// Validate a password
///
/// Rules:
/// - Minimum 7 characters
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validate every editable profile field
pub fn validate_profile(profile: &UserProfile) -> Result<(), UserValidationError> {
    validate_name("first_name", &profile.first_name)?;
    validate_name("last_name", &profile.last_name)?;

    if let Some(github) = &profile.github {
        validate_profile_url("github", github)?;
    }
    if let Some(linkedin) = &profile.linkedin {
        validate_profile_url("linkedin", linkedin)?;
    }
    if let Some(comment) = &profile.comment {
        validate_comment(comment)?;
    }

    Ok(())
}
