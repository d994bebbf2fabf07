//! Team endpoints
//!
//! Any authenticated participant may create, join, leave or vote. Update and
//! delete are checked against ownership (or admin rights) by the service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::{RequireAdmin, RequireUser};
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, Json, LeaveResponse, ListTeamsResponse, TeamDetailResponse, TeamResponse,
    UserResponse,
};
use crate::api::users::parse_user_id;
use crate::domain::team::TeamId;
use crate::domain::DomainError;
use crate::infrastructure::team::{CreateTeamRequest, UpdateTeamRequest};

/// Create the teams router
pub fn create_teams_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/me", get(get_own_team))
        .route("/leave", post(leave_team))
        .route("/invite", post(invite))
        .route("/join/{token}", post(join_team))
        .route("/vote/{team_id}", post(vote))
        .route("/members/{user_id}/remove", post(remove_member))
        .route("/owner/{user_id}", post(transfer_ownership))
        .route(
            "/{team_id}",
            get(get_team).put(update_team).delete(delete_team),
        )
}

fn parse_team_id(raw: &str) -> Result<TeamId, ApiError> {
    TeamId::parse(raw).map_err(|e| ApiError::from(DomainError::from(e)))
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub idea: String,
    /// Up to three addresses invited right away
    #[serde(default)]
    pub invitations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeamBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub idea: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteBody {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub invited: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedTeamResponse {
    pub deleted: bool,
    pub id: String,
}

/// Members and admins see the join token, everyone else the public view
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TeamView {
    Detailed(TeamDetailResponse),
    Public(TeamResponse),
}

/// GET /teams
pub async fn list_teams(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<ListTeamsResponse>, ApiError> {
    debug!("Admin listing teams");

    let teams: Vec<TeamDetailResponse> = state
        .team_service
        .list_with_members()
        .await?
        .iter()
        .map(TeamDetailResponse::from)
        .collect();
    let total = teams.len();

    Ok(Json(ListTeamsResponse { teams, total }))
}

/// POST /teams
pub async fn create_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CreateTeamBody>,
) -> Result<(StatusCode, Json<TeamDetailResponse>), ApiError> {
    debug!(user_id = %user.id(), name = %body.name, "Creating team");

    let request = CreateTeamRequest {
        name: body.name,
        description: body.description,
        idea: body.idea,
        invitations: body.invitations,
    };

    let team = state.team_service.create(user.id(), request).await?;
    let view = state.team_service.get_with_members(team.id()).await?;

    Ok((StatusCode::CREATED, Json(TeamDetailResponse::from(&view))))
}

/// GET /teams/me
pub async fn get_own_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<TeamDetailResponse>, ApiError> {
    let view = state.team_service.own_team(user.id()).await?;
    Ok(Json(TeamDetailResponse::from(&view)))
}

/// GET /teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<TeamView>, ApiError> {
    let team_id = parse_team_id(&team_id)?;
    let view = state.team_service.get_with_members(team_id).await?;

    if user.is_admin() || user.is_member_of(team_id) {
        Ok(Json(TeamView::Detailed(TeamDetailResponse::from(&view))))
    } else {
        Ok(Json(TeamView::Public(TeamResponse::from(&view))))
    }
}

/// PUT /teams/{team_id}
pub async fn update_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
    Json(body): Json<UpdateTeamBody>,
) -> Result<Json<TeamDetailResponse>, ApiError> {
    let team_id = parse_team_id(&team_id)?;
    debug!(user_id = %user.id(), team_id = %team_id, "Updating team");

    let request = UpdateTeamRequest {
        name: body.name,
        description: body.description,
        idea: body.idea,
    };

    state.team_service.update(user.id(), team_id, request).await?;
    let view = state.team_service.get_with_members(team_id).await?;

    Ok(Json(TeamDetailResponse::from(&view)))
}

/// DELETE /teams/{team_id}
pub async fn delete_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<DeletedTeamResponse>, ApiError> {
    let team_id = parse_team_id(&team_id)?;
    debug!(user_id = %user.id(), team_id = %team_id, "Deleting team");

    state.team_service.delete(user.id(), team_id).await?;

    Ok(Json(DeletedTeamResponse {
        deleted: true,
        id: team_id.to_string(),
    }))
}

/// POST /teams/join/{token}
pub async fn join_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(token): Path<String>,
) -> Result<Json<TeamDetailResponse>, ApiError> {
    let team = state.team_service.join(user.id(), &token).await?;
    let view = state.team_service.get_with_members(team.id()).await?;

    Ok(Json(TeamDetailResponse::from(&view)))
}

/// POST /teams/leave
pub async fn leave_team(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<LeaveResponse>, ApiError> {
    let outcome = state.team_service.leave(user.id()).await?;
    Ok(Json(LeaveResponse::from(outcome)))
}

/// POST /teams/invite
pub async fn invite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<InviteBody>,
) -> Result<Json<InviteResponse>, ApiError> {
    state.team_service.invite(user.id(), &body.email).await?;

    Ok(Json(InviteResponse {
        invited: body.email.trim().to_lowercase(),
    }))
}

/// POST /teams/vote/{team_id}
pub async fn vote(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(team_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let team_id = parse_team_id(&team_id)?;
    let user = state.team_service.vote(user.id(), team_id).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /teams/members/{user_id}/remove
pub async fn remove_member(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(user_id): Path<String>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let target = parse_user_id(&user_id)?;
    debug!(actor = %user.id(), target = %target, "Removing team member");

    let outcome = state.team_service.force_leave(user.id(), target).await?;
    Ok(Json(LeaveResponse::from(outcome)))
}

/// POST /teams/owner/{user_id}
pub async fn transfer_ownership(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(user_id): Path<String>,
) -> Result<Json<TeamDetailResponse>, ApiError> {
    let new_owner = parse_user_id(&user_id)?;

    state
        .team_service
        .transfer_ownership(user.id(), new_owner)
        .await?;
    let view = state.team_service.own_team(user.id()).await?;

    Ok(Json(TeamDetailResponse::from(&view)))
}
