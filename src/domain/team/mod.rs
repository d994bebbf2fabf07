//! Team domain module
//!
//! Teams group up to a configured number of participants. A team is valid
//! when at least one member paid the caution; only valid teams can receive
//! votes.

mod entity;
mod repository;
mod validation;

pub use entity::{Team, TeamId, TeamRecord};
pub use repository::TeamRepository;
pub use validation::{
    validate_invitations, validate_team_description, validate_team_idea, validate_team_name,
    TeamValidationError,
};

impl From<TeamValidationError> for crate::domain::DomainError {
    fn from(error: TeamValidationError) -> Self {
        match error {
            TeamValidationError::InvalidId(_) => Self::invalid_id(error.to_string()),
            other => Self::validation(other.to_string()),
        }
    }
}
