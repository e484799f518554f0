//! Metrics read endpoints (design §4.10).

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::api::pagination::{Pagination, PaginationParams};
use crate::error::AppError;
use crate::store::metric_entry::MetricEntrySnapshot;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListMetricsParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub service: Option<String>,
}

pub async fn list_metrics(
    State(state): State<AppState>,
    Query(params): Query<ListMetricsParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::parse(params.pagination)?;
    let mut snapshots: Vec<MetricEntrySnapshot> = state
        .store
        .metric_names()
        .iter()
        .filter_map(|name| state.store.get_metric(name))
        .map(|entry| entry.lock().expect("metric entry lock poisoned").snapshot())
        .filter(|snap| params.service.as_deref().is_none_or(|s| snap.services.contains_key(s)))
        .collect();
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(pagination.paginate(&snapshots)))
}

pub async fn get_metric(State(state): State<AppState>, Path(name): Path<String>) -> Result<impl IntoResponse, AppError> {
    let entry = state.store.get_metric(&name).ok_or_else(|| AppError::NotFound(format!("metric {name}")))?;
    Ok(Json(entry.lock().expect("metric entry lock poisoned").snapshot()))
}
