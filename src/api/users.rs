//! User account endpoints
//!
//! `/users/me*` act on the caller; everything else is admin-only.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::{RequireAdmin, RequireUser};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ListUsersResponse, UserResponse};
use crate::domain::notification::{AnnouncementReport, Audience};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::user::{ChangePasswordRequest, UpdateProfileRequest};

/// Multipart field carrying the CV
const CV_FIELD: &str = "cv";

/// Room for multipart boundaries and headers around the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the users router
pub fn create_users_router(max_cv_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_me).put(update_me))
        .route("/me/password", put(change_password))
        .route(
            "/me/cv",
            post(upload_cv)
                .get(download_own_cv)
                .layer(DefaultBodyLimit::max(max_cv_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/announce", post(announce))
        .route("/{user_id}", delete(delete_user))
        .route("/{user_id}/cv", get(download_cv))
        .route("/{user_id}/caution", post(set_caution))
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).map_err(|e| ApiError::from(DomainError::from(e)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Empty string clears the link
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CautionBody {
    pub paid: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnnounceBody {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub audience: Audience,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
    pub id: String,
}

fn pdf_response(bytes: Vec<u8>, owner: UserId) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"cv-{}.pdf\"", owner),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// GET /users/me
pub async fn get_me(RequireUser(user): RequireUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// PUT /users/me
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(user_id = %user.id(), "Updating profile");

    let request = UpdateProfileRequest {
        first_name: body.first_name,
        last_name: body.last_name,
        github: body.github,
        linkedin: body.linkedin,
        comment: body.comment,
    };

    let user = state.user_service.update_profile(user.id(), request).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /users/me/password
pub async fn change_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<ChangePasswordBody>,
) -> Result<Json<UserResponse>, ApiError> {
    let request = ChangePasswordRequest {
        current_password: body.current_password,
        new_password: body.new_password,
    };

    let user = state.user_service.change_password(user.id(), request).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// POST /users/me/cv
///
/// Multipart upload; the PDF goes in the `cv` field.
pub async fn upload_cv(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(user_id = %user.id(), "Uploading CV");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(CV_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read CV upload: {}", e)))?;

        let user = state
            .user_service
            .attach_cv(user.id(), &file_name, &bytes)
            .await?;
        return Ok(Json(UserResponse::from(&user)));
    }

    Err(ApiError::bad_request("Missing 'cv' file field").with_param(CV_FIELD))
}

/// GET /users/me/cv
pub async fn download_own_cv(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response, ApiError> {
    let bytes = state.user_service.read_cv(user.id()).await?;
    Ok(pdf_response(bytes, user.id()))
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<ListUsersResponse>, ApiError> {
    debug!("Admin listing users");

    let users: Vec<UserResponse> = state
        .user_service
        .list()
        .await?
        .iter()
        .map(UserResponse::from)
        .collect();
    let total = users.len();

    Ok(Json(ListUsersResponse { users, total }))
}

/// GET /users/{user_id}/cv
pub async fn download_cv(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let bytes = state.user_service.read_cv(user_id).await?;

    Ok(pdf_response(bytes, user_id))
}

/// POST /users/{user_id}/caution
pub async fn set_caution(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<String>,
    Json(body): Json<CautionBody>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    debug!(admin_id = %admin.id(), user_id = %user_id, paid = body.paid, "Admin setting caution");

    let user = state
        .user_service
        .set_caution_status(user_id, body.paid)
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /users/{user_id}
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    debug!(admin_id = %admin.id(), user_id = %user_id, "Admin deleting user");

    state.user_service.delete(user_id).await?;

    Ok(Json(DeletedResponse {
        deleted: true,
        id: user_id.to_string(),
    }))
}

/// POST /users/announce
pub async fn announce(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<AnnounceBody>,
) -> Result<Json<AnnouncementReport>, ApiError> {
    let report = state
        .user_service
        .announce(&body.subject, &body.body, body.audience)
        .await?;
    Ok(Json(report))
}
