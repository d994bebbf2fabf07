//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MetricsConfig;

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("valid uuid regex")
});

/// Join tokens are secrets and must never end up in labels
static JOIN_TOKEN_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/teams/join/[^/]+").expect("valid join regex"));

/// Prometheus metrics handle for serving the metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Render the metrics in Prometheus text format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global Prometheus recorder
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("hackathon_api_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at /metrics");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Router exposing `/metrics`
pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Count a successful team state transition (create, join, leave, ...)
pub fn record_team_transition(operation: &'static str) {
    counter!("team_transitions_total", "operation" => operation).increment(1);
}

/// Count a notification attempt by kind and outcome
pub fn record_notification(kind: &'static str, delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    counter!("notifications_total", "kind" => kind, "outcome" => outcome).increment(1);
}

/// Replace identifiers and secrets in a path to keep label cardinality low
/// Replace join tokens and ids in a raw path
pub(crate) fn sanitize_path(path: &str) -> String {
    let path = JOIN_TOKEN_SEGMENT.replace(path, "/teams/join/{token}");
    UUID_SEGMENT.replace_all(&path, "{id}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_uuid() {
        let path = "/teams/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(sanitize_path(path), "/teams/{id}");
    }

    #[test]
    fn test_sanitize_path_nested_uuid() {
        let path = "/users/550e8400-e29b-41d4-a716-446655440000/cv";
        assert_eq!(sanitize_path(path), "/users/{id}/cv");
    }

    #[test]
    fn test_sanitize_path_hides_join_token() {
        let path = "/teams/join/q1w2e3r4t5y6u7i8o9p0-_abcdefghijklmnopqrstu";
        assert_eq!(sanitize_path(path), "/teams/join/{token}");
    }

    #[test]
    fn test_sanitize_path_no_id() {
        assert_eq!(sanitize_path("/health"), "/health");
        assert_eq!(sanitize_path("/teams/me"), "/teams/me");
    }
}
