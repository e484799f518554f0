//! Log read endpoints (design §4.10); entries are keyed by
//! `(serviceName, severityText)` so "get one" needs both path segments.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::api::pagination::{Pagination, PaginationParams};
use crate::error::AppError;
use crate::store::log_entry::LogEntrySnapshot;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListLogsParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub service: Option<String>,
}

pub async fn list_logs(State(state): State<AppState>, Query(params): Query<ListLogsParams>) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::parse(params.pagination)?;
    let mut snapshots: Vec<LogEntrySnapshot> = state
        .store
        .log_keys()
        .iter()
        .filter_map(|(service, severity)| state.store.get_log(service, severity))
        .map(|entry| entry.lock().expect("log entry lock poisoned").snapshot())
        .filter(|snap| params.service.as_deref().is_none_or(|s| s == snap.service_name))
        .collect();
    snapshots.sort_by(|a, b| (&a.service_name, &a.severity_text).cmp(&(&b.service_name, &b.severity_text)));
    Ok(Json(pagination.paginate(&snapshots)))
}

pub async fn get_log(
    State(state): State<AppState>,
    Path((service, severity)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state
        .store
        .get_log(&service, &severity)
        .ok_or_else(|| AppError::NotFound(format!("log entry ({service}, {severity})")))?;
    Ok(Json(entry.lock().expect("log entry lock poisoned").snapshot()))
}
