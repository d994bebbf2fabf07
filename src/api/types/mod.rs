//! Request extractors and response types shared by the handlers

pub mod error;
pub mod json;
pub mod team;
pub mod user;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use team::{LeaveResponse, ListTeamsResponse, TeamDetailResponse, TeamResponse};
pub use user::{ListUsersResponse, MemberProfile, UserResponse};
