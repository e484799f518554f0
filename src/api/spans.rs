//! Span read endpoints (design §4.10), including the mined span-name
//! pattern list that has no per-entry counterpart in metrics/logs.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::api::pagination::{Pagination, PaginationParams};
use crate::error::AppError;
use crate::store::span_entry::{SpanEntrySnapshot, SpanPatternSnapshot};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSpansParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub service: Option<String>,
}

pub async fn list_spans(State(state): State<AppState>, Query(params): Query<ListSpansParams>) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::parse(params.pagination)?;
    let mut snapshots: Vec<SpanEntrySnapshot> = state
        .store
        .span_names()
        .iter()
        .filter_map(|name| state.store.get_span(name))
        .map(|entry| entry.lock().expect("span entry lock poisoned").snapshot())
        .filter(|snap| params.service.as_deref().is_none_or(|s| snap.services.contains_key(s)))
        .collect();
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(pagination.paginate(&snapshots)))
}

pub async fn get_span(State(state): State<AppState>, Path(name): Path<String>) -> Result<impl IntoResponse, AppError> {
    let entry = state.store.get_span(&name).ok_or_else(|| AppError::NotFound(format!("span {name}")))?;
    Ok(Json(entry.lock().expect("span entry lock poisoned").snapshot()))
}

pub async fn list_span_patterns(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::parse(params)?;
    let patterns = state.store.span_patterns();
    let total: u64 = patterns.iter().map(|p| p.lock().expect("span pattern lock poisoned").count).sum();
    let mut snapshots: Vec<SpanPatternSnapshot> =
        patterns.iter().map(|p| p.lock().expect("span pattern lock poisoned").snapshot(total)).collect();
    snapshots.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(Json(pagination.paginate(&snapshots)))
}
