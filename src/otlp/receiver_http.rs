//! HTTP OTLP receiver (design §4.1): `/v1/metrics`, `/v1/traces`,
//! `/v1/logs`, each accepting `application/x-protobuf` or
//! `application/json`. Grounded on `smithclay-otlp2parquet`'s
//! `handle_logs`/`handle_traces`/`handle_metrics` dispatch shape, adapted
//! to decode straight into `opentelemetry-proto`'s `with-serde`-enabled
//! structs instead of a bespoke Arrow conversion.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::de::DeserializeOwned;

use crate::analyzers;
use crate::error::AppError;
use crate::otlp::proto::{
    ExportLogsServiceRequest, ExportLogsServiceResponse, ExportMetricsServiceRequest,
    ExportMetricsServiceResponse, ExportTraceServiceRequest, ExportTraceServiceResponse,
};
use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/metrics", post(handle_metrics))
        .route("/v1/traces", post(handle_traces))
        .route("/v1/logs", post(handle_logs))
        .layer(DefaultBodyLimit::max(state.config.max_request_bytes))
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(axum::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

/// Decode the whole body as protobuf or OTLP JSON, atomically: there is no
/// partial-decode acceptance (design §4.1).
fn decode<T: prost::Message + Default + DeserializeOwned>(content_type: Option<&str>, body: &[u8]) -> Result<T, AppError> {
    match content_type {
        Some(ct) if ct.starts_with("application/json") => {
            serde_json::from_slice(body).map_err(|e| AppError::Decode(e.to_string()))
        }
        _ => T::decode(body).map_err(|e| AppError::Decode(e.to_string())),
    }
}

fn check_size(state: &AppState, body: &Bytes) -> Result<(), AppError> {
    if body.len() > state.config.max_request_bytes {
        return Err(AppError::Oversize { actual: body.len(), limit: state.config.max_request_bytes });
    }
    Ok(())
}

async fn handle_metrics(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<impl IntoResponse, AppError> {
    check_size(&state, &body)?;
    let request: ExportMetricsServiceRequest = decode(content_type(&headers), &body)?;
    analyzers::metrics::analyze(&state.store, &request, state.config.max_value_samples);
    Ok((StatusCode::OK, Json(ExportMetricsServiceResponse { partial_success: None })))
}

async fn handle_traces(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<impl IntoResponse, AppError> {
    check_size(&state, &body)?;
    let request: ExportTraceServiceRequest = decode(content_type(&headers), &body)?;
    analyzers::traces::analyze(&state.store, &state.pattern_masker, &request, state.config.max_value_samples);
    Ok((StatusCode::OK, Json(ExportTraceServiceResponse { partial_success: None })))
}

async fn handle_logs(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<impl IntoResponse, AppError> {
    check_size(&state, &body)?;
    let request: ExportLogsServiceRequest = decode(content_type(&headers), &body)?;
    analyzers::logs::analyze(
        &state.store,
        &state.pattern_masker,
        &state.template_miner,
        &request,
        state.config.max_value_samples,
        state.config.enable_template_mining,
    );
    Ok((StatusCode::OK, Json(ExportLogsServiceResponse { partial_success: None })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pattern_masker::PatternMasker;
    use crate::store::Store;
    use crate::template_miner::SeverityMiners;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(Store::new(100, 10_000)),
            template_miner: Arc::new(SeverityMiners::new(4, Default::default())),
            pattern_masker: Arc::new(PatternMasker::new()),
            config: Arc::new(Config::from_env()),
        }
    }

    #[tokio::test]
    async fn oversize_body_is_rejected_with_413() {
        let mut state = test_state();
        state.config = Arc::new(Config { max_request_bytes: 4, ..Config::from_env() });
        let app = router(state.clone()).with_state(state);

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/metrics")
            .header("content-type", "application/x-protobuf")
            .body(axum::body::Body::from(vec![0u8; 100]))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn malformed_protobuf_is_rejected_with_400() {
        let state = test_state();
        let app = router(state.clone()).with_state(state);

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/metrics")
            .header("content-type", "application/x-protobuf")
            .body(axum::body::Body::from(vec![0xff, 0xff, 0xff]))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_metrics_request_succeeds() {
        let state = test_state();
        let app = router(state.clone()).with_state(state);

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/metrics")
            .header("content-type", "application/x-protobuf")
            .body(axum::body::Body::from(Vec::<u8>::new()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
