//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_http_request, record_notification,
    record_team_transition, PrometheusMetrics,
};
pub(crate) use metrics::sanitize_path;
