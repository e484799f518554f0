//! Service catalog endpoints: the union-of-signal-maps list, and a
//! per-service overview pulling every entry that mentions it (design
//! §4.10's "service overview" query family), grounded on the teacher's
//! `handlers::services::list_services` shape.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::store::log_entry::LogEntrySnapshot;
use crate::store::metric_entry::MetricEntrySnapshot;
use crate::store::span_entry::SpanEntrySnapshot;
use crate::AppState;

pub async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.services())
}

#[derive(Debug, Serialize)]
pub struct ServiceOverview {
    pub service: String,
    pub metrics: Vec<MetricEntrySnapshot>,
    pub spans: Vec<SpanEntrySnapshot>,
    pub logs: Vec<LogEntrySnapshot>,
}

pub async fn service_overview(State(state): State<AppState>, Path(service): Path<String>) -> impl IntoResponse {
    let metrics: Vec<MetricEntrySnapshot> = state
        .store
        .metric_names()
        .iter()
        .filter_map(|name| state.store.get_metric(name))
        .map(|entry| entry.lock().expect("metric entry lock poisoned").snapshot())
        .filter(|snap| snap.services.contains_key(&service))
        .collect();

    let spans: Vec<SpanEntrySnapshot> = state
        .store
        .span_names()
        .iter()
        .filter_map(|name| state.store.get_span(name))
        .map(|entry| entry.lock().expect("span entry lock poisoned").snapshot())
        .filter(|snap| snap.services.contains_key(&service))
        .collect();

    let logs: Vec<LogEntrySnapshot> = state
        .store
        .log_keys()
        .iter()
        .filter_map(|(svc, severity)| state.store.get_log(svc, severity))
        .map(|entry| entry.lock().expect("log entry lock poisoned").snapshot())
        .filter(|snap| snap.service_name == service)
        .collect();

    Json(ServiceOverview { service, metrics, spans, logs })
}
