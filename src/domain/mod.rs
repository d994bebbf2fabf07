//! Domain layer - Core business logic and entities

pub mod error;
pub mod membership;
pub mod notification;
pub mod team;
pub mod user;

pub use error::DomainError;
pub use membership::{MembershipMutator, OwnerLeavePolicy, TeamLookup};
pub use notification::{AnnouncementReport, Audience, Notifier};
pub use team::{Team, TeamId, TeamRepository};
pub use user::{CvStorage, MembershipState, User, UserId, UserProfile, UserRepository};
