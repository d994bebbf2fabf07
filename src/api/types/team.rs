//! Team representations returned by the API

use serde::Serialize;

use super::user::MemberProfile;
use crate::infrastructure::team::{LeaveOutcome, TeamWithMembers};

/// Team as any participant may see it
#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub idea: String,
    pub is_valid: bool,
    pub members: Vec<MemberProfile>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&TeamWithMembers> for TeamResponse {
    fn from(view: &TeamWithMembers) -> Self {
        let team = &view.team;
        Self {
            id: team.id().to_string(),
            name: team.name().to_string(),
            description: team.description().to_string(),
            idea: team.idea().to_string(),
            is_valid: team.is_valid(),
            members: view.members.iter().map(MemberProfile::from).collect(),
            created_at: team.created_at().to_rfc3339(),
            updated_at: team.updated_at().to_rfc3339(),
        }
    }
}

/// Team including its join token, for members and admins
#[derive(Debug, Clone, Serialize)]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub token: String,
}

impl From<&TeamWithMembers> for TeamDetailResponse {
    fn from(view: &TeamWithMembers) -> Self {
        Self {
            team: TeamResponse::from(view),
            token: view.team.token().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListTeamsResponse {
    pub teams: Vec<TeamDetailResponse>,
    pub total: usize,
}

/// Result of leaving or removing a member
#[derive(Debug, Clone, Serialize)]
pub struct LeaveResponse {
    pub team_id: String,
    /// True when the departing user was the last member
    pub dissolved: bool,
    /// Validity of the remaining team, absent once dissolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
}

impl From<LeaveOutcome> for LeaveResponse {
    fn from(outcome: LeaveOutcome) -> Self {
        match outcome {
            LeaveOutcome::Left { team_id, valid } => Self {
                team_id: team_id.to_string(),
                dissolved: false,
                is_valid: Some(valid),
            },
            LeaveOutcome::Dissolved { team_id } => Self {
                team_id: team_id.to_string(),
                dissolved: true,
                is_valid: None,
            },
        }
    }
}
