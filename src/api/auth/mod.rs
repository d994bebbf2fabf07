//! Authentication endpoints
//!
//! Registration, token issuance and rotation, logout and the password reset
//! flow. Only logout requires a bearer token.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, UserResponse};
use crate::infrastructure::auth::{RegisterRequest, TokenPair};

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/password-reset/request", post(request_password_reset))
        .route("/password-reset/confirm", post(confirm_password_reset))
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub image_agreement: bool,
    #[serde(default)]
    pub subscribe_formation: bool,
}

impl From<RegisterBody> for RegisterRequest {
    fn from(body: RegisterBody) -> Self {
        Self {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            github: body.github,
            linkedin: body.linkedin,
            comment: body.comment,
            image_agreement: body.image_agreement,
            subscribe_formation: body.subscribe_formation,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequestBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmBody {
    pub token: String,
    pub new_password: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    debug!("Registering new account");

    let user = state.auth_service.register(body.into()).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state.auth_service.login(&body.email, &body.password).await?;
    Ok(Json(tokens))
}

/// POST /auth/refresh
///
/// Rotates the pair; the submitted refresh token stops working.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state.auth_service.refresh(&body.refresh_token).await?;
    Ok(Json(tokens))
}

/// POST /auth/logout
///
/// Revokes the refresh token. Access tokens stay valid until they expire.
pub async fn logout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth_service.logout(user.id()).await?;
    Ok(MessageResponse::new("Logged out successfully"))
}

/// POST /auth/password-reset/request
///
/// Always answers the same way so account existence is not revealed.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequestBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth_service.request_password_reset(&body.email).await?;
    Ok(MessageResponse::new(
        "If an account exists for this address, a reset link has been sent",
    ))
}

/// POST /auth/password-reset/confirm
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetConfirmBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth_service
        .reset_password(&body.token, &body.new_password)
        .await?;
    Ok(MessageResponse::new("Password updated"))
}
