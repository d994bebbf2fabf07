//! API middleware components

pub mod admin_auth;
pub mod logging;
pub mod metrics;
pub mod user_auth;

use axum::{body::Body, extract::MatchedPath, http::Request};
use tracing::Span;

use crate::infrastructure::observability::sanitize_path;

pub use admin_auth::RequireAdmin;
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use user_auth::RequireUser;

/// Route template of a request (`/teams/{team_id}`), falling back to the
/// sanitized raw path
pub(crate) fn route_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| sanitize_path(request.uri().path()))
}

/// Span for `TraceLayer`; records the route, never the URI
pub(crate) fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        route = %route_path(request),
        version = ?request.version(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path_hides_join_token_without_match() {
        let request = Request::builder()
            .uri("/teams/join/s3cr3t-t0ken/extra?x=1")
            .body(Body::empty())
            .unwrap();

        let path = route_path(&request);
        assert_eq!(path, "/teams/join/{token}/extra");
        assert!(!path.contains("s3cr3t"));
    }
}
