//! Team validation

use thiserror::Error;

use crate::domain::user::validate_email;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team ID is not a valid UUID: '{0}'")]
    InvalidId(String),

    #[error("Team name must be between {min} and {max} characters")]
    NameLength { min: usize, max: usize },

    #[error("Team name cannot be blank")]
    BlankName,

    #[error("Team description cannot exceed {0} characters")]
    DescriptionTooLong(usize),

    #[error("Team idea cannot exceed {0} characters")]
    IdeaTooLong(usize),

    #[error("At most {0} invitations can be sent when creating a team")]
    TooManyInvitations(usize),

    #[error("Invitation address '{0}' is not a valid email")]
    InvalidInvitation(String),
}

const MIN_TEAM_NAME_LENGTH: usize = 3;
const MAX_TEAM_NAME_LENGTH: usize = 35;
const MAX_TEXT_LENGTH: usize = 1024;
const MAX_INVITATIONS: usize = 3;

/// Validate a team name
pub fn validate_team_name(name: &str) -> Result<(), TeamValidationError> {
    if name.trim().is_empty() {
        return Err(TeamValidationError::BlankName);
    }

    let length = name.chars().count();
    if !(MIN_TEAM_NAME_LENGTH..=MAX_TEAM_NAME_LENGTH).contains(&length) {
        return Err(TeamValidationError::NameLength {
            min: MIN_TEAM_NAME_LENGTH,
            max: MAX_TEAM_NAME_LENGTH,
        });
    }

    Ok(())
}

pub fn validate_team_description(description: &str) -> Result<(), TeamValidationError> {
    if description.chars().count() > MAX_TEXT_LENGTH {
        return Err(TeamValidationError::DescriptionTooLong(MAX_TEXT_LENGTH));
    }
    Ok(())
}

pub fn validate_team_idea(idea: &str) -> Result<(), TeamValidationError> {
    if idea.chars().count() > MAX_TEXT_LENGTH {
        return Err(TeamValidationError::IdeaTooLong(MAX_TEXT_LENGTH));
    }
    Ok(())
}

/// Validate the invitation list sent along with team creation.
///
/// Addresses are expected to be normalized already.
pub fn validate_invitations(invitations: &[String]) -> Result<(), TeamValidationError> {
    if invitations.len() > MAX_INVITATIONS {
        return Err(TeamValidationError::TooManyInvitations(MAX_INVITATIONS));
    }

    for email in invitations {
        if validate_email(email).is_err() {
            return Err(TeamValidationError::InvalidInvitation(email.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_team_names() {
        assert!(validate_team_name("Rockets").is_ok());
        assert!(validate_team_name("abc").is_ok());
        assert!(validate_team_name(&"x".repeat(35)).is_ok());
    }

    #[test]
    fn test_invalid_team_names() {
        assert_eq!(validate_team_name("   "), Err(TeamValidationError::BlankName));
        assert!(matches!(
            validate_team_name("ab"),
            Err(TeamValidationError::NameLength { .. })
        ));
        assert!(matches!(
            validate_team_name(&"x".repeat(36)),
            Err(TeamValidationError::NameLength { .. })
        ));
    }

    #[test]
    fn test_text_limits() {
        assert!(validate_team_description("").is_ok());
        assert!(validate_team_idea(&"i".repeat(1024)).is_ok());
        assert_eq!(
            validate_team_description(&"d".repeat(1025)),
            Err(TeamValidationError::DescriptionTooLong(1024))
        );
        assert_eq!(
            validate_team_idea(&"i".repeat(1025)),
            Err(TeamValidationError::IdeaTooLong(1024))
        );
    }

    #[test]
    fn test_invitations() {
        let ok = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        assert!(validate_invitations(&ok).is_ok());

        let too_many: Vec<String> = (0..4).map(|i| format!("u{i}@example.com")).collect();
        assert_eq!(
            validate_invitations(&too_many),
            Err(TeamValidationError::TooManyInvitations(3))
        );

        let bad = vec!["nope".to_string()];
        assert_eq!(
            validate_invitations(&bad),
            Err(TeamValidationError::InvalidInvitation("nope".to_string()))
        );
    }
}
