//! User representations returned by the API

use serde::Serialize;

use crate::domain::user::User;

/// Full profile, shown to the user themself and to admins
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub comment: Option<String>,
    pub has_cv: bool,
    pub paid_caution: bool,
    pub is_admin: bool,
    pub is_team_owner: bool,
    pub team_id: Option<String>,
    pub vote_id: Option<String>,
    pub image_agreement: bool,
    pub subscribe_formation: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            github: user.github().map(String::from),
            linkedin: user.linkedin().map(String::from),
            comment: user.comment().map(String::from),
            has_cv: user.cv().is_some(),
            paid_caution: user.paid_caution(),
            is_admin: user.is_admin(),
            is_team_owner: user.is_team_owner(),
            team_id: user.team_id().map(|id| id.to_string()),
            vote_id: user.vote_id().map(|id| id.to_string()),
            image_agreement: user.image_agreement(),
            subscribe_formation: user.subscribe_formation(),
            created_at: user.created_at().to_rfc3339(),
            updated_at: user.updated_at().to_rfc3339(),
        }
    }
}

/// Public view of a team member; no email, comment or CV
#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub is_team_owner: bool,
    pub paid_caution: bool,
}

impl From<&User> for MemberProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            github: user.github().map(String::from),
            linkedin: user.linkedin().map(String::from),
            is_team_owner: user.is_team_owner(),
            paid_caution: user.paid_caution(),
        }
    }
}

/// List wrapper for admin user listings
#[derive(Debug, Clone, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}
