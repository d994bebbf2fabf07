//! Health, readiness and liveness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub status: ProbeStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<DependencyCheck>,
}

/// Outcome of probing one dependency
#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub name: &'static str,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// GET /health: 200 while the process serves requests
pub async fn health_check() -> impl IntoResponse {
    Json(ProbeResponse {
        status: ProbeStatus::Healthy,
        version: env!("CARGO_PKG_VERSION"),
        checks: Vec::new(),
    })
}

/// GET /ready: 503 until the user store answers
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = check_user_store(&state).await;
    let status = store.status;

    let code = match status {
        ProbeStatus::Healthy => StatusCode::OK,
        ProbeStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(ProbeResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            checks: vec![store],
        }),
    )
}

/// GET /live
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_user_store(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    let result = state.user_service.count().await;

    DependencyCheck {
        name: "user_store",
        status: if result.is_ok() {
            ProbeStatus::Healthy
        } else {
            ProbeStatus::Unhealthy
        },
        message: result.err().map(|e| e.to_string()),
        latency_ms: start.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_without_checks() {
        let response = ProbeResponse {
            status: ProbeStatus::Healthy,
            version: "1.0.0",
            checks: Vec::new(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json.get("checks").is_none());
    }

    #[test]
    fn test_failed_dependency_is_reported() {
        let response = ProbeResponse {
            status: ProbeStatus::Unhealthy,
            version: "1.0.0",
            checks: vec![DependencyCheck {
                name: "user_store",
                status: ProbeStatus::Unhealthy,
                message: Some("pool timed out".to_string()),
                latency_ms: 30_000,
            }],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["checks"][0]["status"], "unhealthy");
        assert_eq!(json["checks"][0]["message"], "pool timed out");
    }
}
