use axum::{middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::auth;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware, request_span};
use super::state::AppState;
use super::teams;
use super::users;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state
pub fn create_router_with_state(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let max_cv_bytes = state.max_cv_bytes;

    let mut router = Router::new()
        // Probes
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/auth", auth::create_auth_router())
        .nest("/users", users::create_users_router(max_cv_bytes))
        .nest("/teams", teams::create_teams_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m));
    }

    router
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppConfig;
    use crate::infrastructure::notification::LogNotifier;
    use crate::infrastructure::user::InMemoryCvStorage;
    use crate::{Services, Stores};

    struct TestApp {
        router: Router,
        services: Services,
    }

    impl TestApp {
        fn new() -> Self {
            let services = Services::build(
                &AppConfig::default(),
                Stores::in_memory(),
                Arc::new(InMemoryCvStorage::new()),
                Arc::new(LogNotifier::default()),
            );
            let router = create_router_with_state(services.clone().into_state(), None);
            Self { router, services }
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let body = match body {
                Some(value) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        /// Register and log in, returning the access and refresh tokens
        async fn participant(&self, first_name: &str) -> (String, String) {
            let email = format!("{}@example.com", first_name.to_lowercase());
            let (status, _) = self
                .send(
                    Method::POST,
                    "/auth/register",
                    None,
                    Some(json!({
                        "email": email,
                        "password": "hunter22",
                        "first_name": first_name,
                        "last_name": "Tester",
                        "image_agreement": true
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, tokens) = self
                .send(
                    Method::POST,
                    "/auth/login",
                    None,
                    Some(json!({"email": email, "password": "hunter22"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);

            (
                tokens["access_token"].as_str().unwrap().to_string(),
                tokens["refresh_token"].as_str().unwrap().to_string(),
            )
        }
    }

    #[tokio::test]
    async fn test_probes() {
        let app = TestApp::new();

        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = app.send(Method::GET, "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "user_store");

        let (status, _) = app.send(Method::GET, "/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let app = TestApp::new();

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_register_login_and_profile() {
        let app = TestApp::new();
        let (access, _) = app.participant("Ada").await;

        let (status, me) = app.send(Method::GET, "/users/me", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "ada@example.com");
        assert_eq!(me["team_id"], Value::Null);
        assert!(me.get("password_hash").is_none());

        let (status, me) = app
            .send(
                Method::PUT,
                "/users/me",
                Some(&access),
                Some(json!({"last_name": "Lovelace"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["last_name"], "Lovelace");
    }

    #[tokio::test]
    async fn test_register_requires_image_agreement() {
        let app = TestApp::new();

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": "ada@example.com",
                    "password": "hunter22",
                    "first_name": "Ada",
                    "last_name": "Lovelace"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_bad_credentials_and_missing_token() {
        let app = TestApp::new();
        app.participant("Ada").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "ada@example.com", "password": "wrong-one"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "invalid email or password");

        let (status, body) = app.send(Method::GET, "/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_refresh_rotation() {
        let app = TestApp::new();
        let (_, refresh) = app.participant("Ada").await;

        let (status, rotated) = app
            .send(
                Method::POST,
                "/auth/refresh",
                None,
                Some(json!({"refresh_token": refresh})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rotated["token_type"], "Bearer");

        let (status, _) = app
            .send(
                Method::POST,
                "/auth/refresh",
                None,
                Some(json!({"refresh_token": refresh})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_team_lifecycle() {
        let app = TestApp::new();
        let (alice, _) = app.participant("Alice").await;
        let (bob, _) = app.participant("Bob").await;

        let (status, team) = app
            .send(
                Method::POST,
                "/teams",
                Some(&alice),
                Some(json!({"name": "Rockets", "idea": "Reusable boosters"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(team["is_valid"], false);
        let team_id = team["id"].as_str().unwrap().to_string();
        let token = team["token"].as_str().unwrap().to_string();

        // Outsiders get the public view
        let (status, public) = app
            .send(Method::GET, &format!("/teams/{}", team_id), Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(public.get("token").is_none());
        assert!(public["members"][0].get("email").is_none());

        let (status, joined) = app
            .send(Method::POST, &format!("/teams/join/{}", token), Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(joined["members"].as_array().unwrap().len(), 2);

        let (status, body) = app
            .send(Method::POST, "/teams/join/not-a-token", Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "state_violation");

        let (status, body) = app
            .send(Method::POST, &format!("/teams/vote/{}", team_id), Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "cannot vote for your own team");

        let (status, left) = app.send(Method::POST, "/teams/leave", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(left["dissolved"], false);

        let (status, left) = app.send(Method::POST, "/teams/leave", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(left["dissolved"], true);

        let (status, _) = app.send(Method::GET, "/teams/me", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_routes() {
        let app = TestApp::new();
        let (admin, _) = app.participant("Grace").await;
        let (ada, _) = app.participant("Ada").await;

        let (status, body) = app.send(Method::GET, "/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["type"], "permission_error");

        app.services
            .users
            .grant_admin("grace@example.com")
            .await
            .unwrap();

        let (status, body) = app.send(Method::GET, "/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);

        let ada_id = app
            .services
            .users
            .get_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap()
            .id();

        let (status, user) = app
            .send(
                Method::POST,
                &format!("/users/{}/caution", ada_id),
                Some(&admin),
                Some(json!({"paid": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["paid_caution"], true);

        let (status, body) = app
            .send(Method::POST, "/users/not-a-uuid/caution", Some(&admin), Some(json!({"paid": true})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "id");

        let (status, _) = app
            .send(Method::GET, "/teams", Some(&ada), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(Method::DELETE, &format!("/users/{}", ada_id), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        // The deleted account's token no longer resolves to a user
        let (status, _) = app.send(Method::GET, "/users/me", Some(&ada), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cv_upload_and_download() {
        let app = TestApp::new();
        let (access, _) = app.participant("Ada").await;

        let boundary = "XBOUNDARYX";
        let payload = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"resume.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF-1.4 ada\r\n--{b}--\r\n",
            b = boundary
        );

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/users/me/cv")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/users/me/cv")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 ada");
    }
}
