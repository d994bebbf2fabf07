//! User authentication extractor using JWT access tokens

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::user::User;
use crate::domain::DomainError;

/// The authenticated caller, loaded fresh from the store.
///
/// Refresh tokens are refused, and so are tokens of deleted accounts.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = state.auth_service.authenticate(bearer_token(&parts.headers)?)?;
        let user_id = claims.user_id()?;

        debug!(user_id = %user_id, "Access token accepted");

        let user = state
            .user_service
            .get(user_id)
            .await
            .map_err(|e| match e {
                DomainError::NotFound { .. } => ApiError::unauthorized("User not found"),
                other => other.into(),
            })?;

        Ok(RequireUser(user))
    }
}

/// Bearer credential of a request; the scheme is matched case-insensitively
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(ApiError::unauthorized("Missing bearer token"));
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(ApiError::unauthorized(
            "Expected 'Authorization: Bearer <access token>'",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        let jwt = headers("Bearer eyJhbGciOiJIUzI1NiJ9.test");
        assert_eq!(bearer_token(&jwt).unwrap(), "eyJhbGciOiJIUzI1NiJ9.test");

        let padded = headers("bearer   padded   ");
        assert_eq!(bearer_token(&padded).unwrap(), "padded");
    }

    #[test]
    fn test_missing_or_foreign_scheme() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.response.error.message, "Missing bearer token");

        assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_token(&headers("Bearer ")).is_err());
    }
}
