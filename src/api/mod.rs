//! REST read API (design §4.10 / §6): one handler module per resource,
//! following the teacher's `handlers/` layout, mounted under `/api/v1/`.

pub mod attributes;
pub mod health;
pub mod logs;
pub mod metrics;
pub mod pagination;
pub mod services;
pub mod spans;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/metrics", get(metrics::list_metrics))
        .route("/api/v1/metrics/{name}", get(metrics::get_metric))
        .route("/api/v1/spans", get(spans::list_spans))
        .route("/api/v1/spans/{name}", get(spans::get_span))
        .route("/api/v1/span-patterns", get(spans::list_span_patterns))
        .route("/api/v1/logs", get(logs::list_logs))
        .route("/api/v1/logs/{service}/{severity}", get(logs::get_log))
        .route("/api/v1/services", get(services::list_services))
        .route("/api/v1/services/{service}", get(services::service_overview))
        .route("/api/v1/attributes", get(attributes::list_attributes))
        .route("/api/v1/attributes/high-cardinality", get(attributes::high_cardinality_keys))
        .route("/api/v1/attributes/metadata-complexity", get(attributes::metadata_complexity))
        .route("/healthz", get(health::healthz))
}
