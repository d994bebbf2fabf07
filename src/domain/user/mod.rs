//! User domain
//!
//! Participant accounts: entity, field validation, repository trait and the
//! CV storage seam.

mod cv;
mod entity;
mod repository;
mod validation;

pub use cv::CvStorage;
pub use entity::{MembershipState, User, UserId, UserProfile, UserRecord};
pub use repository::UserRepository;
pub use validation::{
    normalize_email, validate_comment, validate_email, validate_name, validate_password,
    validate_profile, validate_profile_url, UserValidationError,
};

impl From<UserValidationError> for crate::domain::DomainError {
    fn from(error: UserValidationError) -> Self {
        match error {
            UserValidationError::InvalidId(_) => Self::invalid_id(error.to_string()),
            other => Self::validation(other.to_string()),
        }
    }
}
