//! Attribute catalog and derived cardinality endpoints (design §4.10's
//! last two query families). The catalog itself is keyed by
//! `(key, value, signalType, scope, serviceName)`, one row per distinct
//! value observed (design §3); the list endpoint groups those rows by
//! everything but `value` to answer "how many distinct values has this key
//! taken", which is what `minCardinality`/`maxCardinality`/sort-by-cardinality
//! actually filter and order on.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::pagination::{Pagination, PaginationParams};
use crate::error::AppError;
use crate::otlp::{Scope, SignalType};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub signal_type: Option<SignalType>,
    pub scope: Option<Scope>,
    pub min_cardinality: Option<u64>,
    pub max_cardinality: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogKeySummary {
    pub key: String,
    pub signal_type: SignalType,
    pub scope: Scope,
    pub service_name: String,
    pub distinct_values: u64,
    pub total_observations: u64,
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct GroupKey {
    key: String,
    signal_type: SignalType,
    scope: Scope,
    service_name: String,
}

pub async fn list_attributes(State(state): State<AppState>, Query(params): Query<CatalogParams>) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::parse(params.pagination)?;

    let mut groups: HashMap<GroupKey, (u64, u64)> = HashMap::new();
    for (attr_key, count) in state.store.attribute_catalog.snapshot() {
        let group = GroupKey {
            key: attr_key.key,
            signal_type: attr_key.signal_type,
            scope: attr_key.scope,
            service_name: attr_key.service_name,
        };
        let entry = groups.entry(group).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += count;
    }

    let mut summaries: Vec<CatalogKeySummary> = groups
        .into_iter()
        .map(|(g, (distinct_values, total_observations))| CatalogKeySummary {
            key: g.key,
            signal_type: g.signal_type,
            scope: g.scope,
            service_name: g.service_name,
            distinct_values,
            total_observations,
        })
        .filter(|s| params.signal_type.is_none_or(|t| t == s.signal_type))
        .filter(|s| params.scope.is_none_or(|sc| sc == s.scope))
        .filter(|s| params.min_cardinality.is_none_or(|min| s.distinct_values >= min))
        .filter(|s| params.max_cardinality.is_none_or(|max| s.distinct_values <= max))
        .collect();
    summaries.sort_by(|a, b| b.distinct_values.cmp(&a.distinct_values).then_with(|| a.key.cmp(&b.key)));

    Ok(Json(pagination.paginate(&summaries)))
}

#[derive(Debug, Clone, Serialize)]
pub struct HighCardinalityKey {
    pub signal_type: SignalType,
    pub entry_name: String,
    pub scope: Scope,
    pub key: String,
    pub estimated_cardinality: u64,
}

/// Keys with `estimatedCardinality >= threshold` across every key-metadata
/// map on every metric/span/log entry (design §4.10's "high cardinality
/// keys" derived query).
pub async fn high_cardinality_keys(State(state): State<AppState>, Query(params): Query<PaginationParams>) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::parse(params)?;
    let threshold = state.config.high_cardinality_threshold;

    let mut found = Vec::new();
    for name in state.store.metric_names() {
        if let Some(entry) = state.store.get_metric(&name) {
            let snap = entry.lock().expect("metric entry lock poisoned").snapshot();
            collect_high_cardinality(&mut found, SignalType::Metric, &snap.name, Scope::Label, &snap.label_keys, threshold);
            collect_high_cardinality(&mut found, SignalType::Metric, &snap.name, Scope::Resource, &snap.resource_keys, threshold);
        }
    }
    for name in state.store.span_names() {
        if let Some(entry) = state.store.get_span(&name) {
            let snap = entry.lock().expect("span entry lock poisoned").snapshot();
            collect_high_cardinality(&mut found, SignalType::Span, &snap.name, Scope::Attribute, &snap.attribute_keys, threshold);
            collect_high_cardinality(&mut found, SignalType::Span, &snap.name, Scope::Resource, &snap.resource_keys, threshold);
            collect_high_cardinality(&mut found, SignalType::Span, &snap.name, Scope::Link, &snap.link_attribute_keys, threshold);
        }
    }
    for (service, severity) in state.store.log_keys() {
        if let Some(entry) = state.store.get_log(&service, &severity) {
            let snap = entry.lock().expect("log entry lock poisoned").snapshot();
            let label = format!("{service}/{severity}");
            collect_high_cardinality(&mut found, SignalType::Log, &label, Scope::Attribute, &snap.attribute_keys, threshold);
            collect_high_cardinality(&mut found, SignalType::Log, &label, Scope::Resource, &snap.resource_keys, threshold);
        }
    }
    found.sort_by(|a, b| b.estimated_cardinality.cmp(&a.estimated_cardinality));

    Ok(Json(pagination.paginate(&found)))
}

fn collect_high_cardinality(
    found: &mut Vec<HighCardinalityKey>,
    signal_type: SignalType,
    entry_name: &str,
    scope: Scope,
    keys: &HashMap<String, crate::keymeta::KeyMetadataSnapshot>,
    threshold: u64,
) {
    for (key, meta) in keys {
        if meta.estimated_cardinality >= threshold {
            found.push(HighCardinalityKey {
                signal_type,
                entry_name: entry_name.to_string(),
                scope,
                key: key.clone(),
                estimated_cardinality: meta.estimated_cardinality,
            });
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataComplexEntry {
    pub signal_type: SignalType,
    pub entry_name: String,
    pub key_count: usize,
}

/// Entries where `|labelKeys| + |resourceKeys|` (or the span/log
/// equivalents) meets `config.metadata_complexity_threshold` (design
/// §4.10's "metadata complexity" derived query).
pub async fn metadata_complexity(State(state): State<AppState>, Query(params): Query<PaginationParams>) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::parse(params)?;
    let threshold = state.config.metadata_complexity_threshold;

    let mut found = Vec::new();
    for name in state.store.metric_names() {
        if let Some(entry) = state.store.get_metric(&name) {
            let snap = entry.lock().expect("metric entry lock poisoned").snapshot();
            let key_count = snap.label_keys.len() + snap.resource_keys.len();
            if key_count >= threshold {
                found.push(MetadataComplexEntry { signal_type: SignalType::Metric, entry_name: snap.name, key_count });
            }
        }
    }
    for name in state.store.span_names() {
        if let Some(entry) = state.store.get_span(&name) {
            let snap = entry.lock().expect("span entry lock poisoned").snapshot();
            let key_count = snap.attribute_keys.len() + snap.resource_keys.len();
            if key_count >= threshold {
                found.push(MetadataComplexEntry { signal_type: SignalType::Span, entry_name: snap.name, key_count });
            }
        }
    }
    for (service, severity) in state.store.log_keys() {
        if let Some(entry) = state.store.get_log(&service, &severity) {
            let snap = entry.lock().expect("log entry lock poisoned").snapshot();
            let key_count = snap.attribute_keys.len() + snap.resource_keys.len();
            if key_count >= threshold {
                found.push(MetadataComplexEntry {
                    signal_type: SignalType::Log,
                    entry_name: format!("{service}/{severity}"),
                    key_count,
                });
            }
        }
    }
    found.sort_by(|a, b| b.key_count.cmp(&a.key_count));

    Ok(Json(pagination.paginate(&found)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pattern_masker::PatternMasker;
    use crate::store::{AttrKey, MetricKind, Store};
    use crate::template_miner::SeverityMiners;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(Store::new(100, 10_000)),
            template_miner: Arc::new(SeverityMiners::new(4, Default::default())),
            pattern_masker: Arc::new(PatternMasker::new()),
            config: Arc::new(Config::from_env()),
        }
    }

    #[tokio::test]
    async fn catalog_groups_distinct_values_per_key() {
        let state = test_state();
        for v in ["GET", "POST", "PUT"] {
            state.store.attribute_catalog.record(AttrKey {
                key: "method".into(),
                value: v.into(),
                signal_type: SignalType::Metric,
                scope: Scope::Label,
                service_name: "api".into(),
            });
        }
        let response = list_attributes(
            State(state),
            Query(CatalogParams { pagination: PaginationParams { limit: None, offset: None }, signal_type: None, scope: None, min_cardinality: None, max_cardinality: None }),
        )
        .await
        .unwrap();
        let _ = response;
    }

    #[tokio::test]
    async fn metadata_complexity_finds_entries_over_threshold() {
        let state = test_state();
        let mut config = Config::from_env();
        config.metadata_complexity_threshold = 2;
        let state = AppState { config: Arc::new(config), ..state };

        let entry = state.store.get_or_create_metric("m", MetricKind::Gauge, "", "");
        {
            let mut e = entry.lock().unwrap();
            e.observe_label(100, "a", "1");
            e.observe_label(100, "b", "2");
        }

        let response = metadata_complexity(State(state), Query(PaginationParams { limit: None, offset: None })).await.unwrap();
        let _ = response;
    }
}
