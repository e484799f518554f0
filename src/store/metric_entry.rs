//! Metric entry: unique by metric name (design §"Data Model" / §4.3).

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::hll::HyperLogLog;
use crate::keymeta::{KeyMetadata, KeyMetadataSnapshot};

/// The OTLP metric type discriminant. Set on first observation and never
/// mutated afterward; later observations under a different kind are logged
/// and otherwise ignored for the purpose of this field (design §9's tagged
/// variant note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Sum,
    Histogram,
    ExponentialHistogram,
    Summary,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MetricKind::Gauge => "Gauge",
            MetricKind::Sum => "Sum",
            MetricKind::Histogram => "Histogram",
            MetricKind::ExponentialHistogram => "ExponentialHistogram",
            MetricKind::Summary => "Summary",
        };
        f.write_str(s)
    }
}

pub struct MetricEntry {
    pub name: String,
    pub kind: MetricKind,
    pub unit: String,
    pub description: String,
    pub is_monotonic: Option<bool>,
    pub sample_count: u64,
    pub services: HashMap<String, u64>,
    pub label_keys: HashMap<String, KeyMetadata>,
    pub resource_keys: HashMap<String, KeyMetadata>,
    series_fingerprints: HyperLogLog,
    /// f64 bit patterns, so the bound set can live in a `BTreeSet`.
    pub histogram_bucket_bounds: BTreeSet<u64>,
    pub exponential_histogram_scales: BTreeSet<i32>,
}

impl MetricEntry {
    pub fn new(name: String, kind: MetricKind, unit: String, description: String) -> Self {
        Self {
            name,
            kind,
            unit,
            description,
            is_monotonic: None,
            sample_count: 0,
            services: HashMap::new(),
            label_keys: HashMap::new(),
            resource_keys: HashMap::new(),
            series_fingerprints: HyperLogLog::new(),
            histogram_bucket_bounds: BTreeSet::new(),
            exponential_histogram_scales: BTreeSet::new(),
        }
    }

    /// Logs and otherwise ignores a type mismatch; the entry's kind never
    /// changes after creation.
    pub fn check_kind(&self, observed: MetricKind) {
        if observed != self.kind {
            tracing::warn!(
                metric = %self.name,
                recorded_kind = %self.kind,
                observed_kind = %observed,
                "metric observed with a different type than its first observation"
            );
        }
    }

    pub fn record_service(&mut self, service: &str) {
        self.sample_count += 1;
        *self.services.entry(service.to_string()).or_insert(0) += 1;
    }

    pub fn observe_label(&mut self, max_samples: usize, key: &str, value: &str) {
        self.label_keys
            .entry(key.to_string())
            .or_insert_with(|| KeyMetadata::new(max_samples))
            .add_value(value);
    }

    pub fn observe_resource(&mut self, max_samples: usize, key: &str, value: &str) {
        self.resource_keys
            .entry(key.to_string())
            .or_insert_with(|| KeyMetadata::new(max_samples))
            .add_value(value);
    }

    pub fn add_fingerprint(&mut self, fingerprint: u64) {
        self.series_fingerprints.add(&fingerprint.to_string());
    }

    pub fn active_series_estimate(&self) -> u64 {
        self.series_fingerprints.estimate()
    }

    pub fn add_histogram_bound(&mut self, bound: f64) {
        self.histogram_bucket_bounds.insert(bound.to_bits());
    }

    pub fn add_exponential_scale(&mut self, scale: i32) {
        self.exponential_histogram_scales.insert(scale);
    }

    pub fn set_monotonic(&mut self, monotonic: bool) {
        self.is_monotonic = Some(monotonic);
    }

    pub fn snapshot(&self) -> MetricEntrySnapshot {
        let key_snapshot = |m: &HashMap<String, KeyMetadata>| -> HashMap<String, KeyMetadataSnapshot> {
            m.iter().map(|(k, v)| (k.clone(), v.snapshot(self.sample_count))).collect()
        };
        MetricEntrySnapshot {
            name: self.name.clone(),
            r#type: self.kind.to_string(),
            unit: self.unit.clone(),
            description: self.description.clone(),
            is_monotonic: self.is_monotonic,
            sample_count: self.sample_count,
            services: self.services.clone(),
            label_keys: key_snapshot(&self.label_keys),
            resource_keys: key_snapshot(&self.resource_keys),
            active_series_estimate: self.active_series_estimate(),
            histogram_bucket_bounds: self.histogram_bucket_bounds.iter().map(|b| f64::from_bits(*b)).collect(),
            exponential_histogram_scales: self.exponential_histogram_scales.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricEntrySnapshot {
    pub name: String,
    pub r#type: String,
    pub unit: String,
    pub description: String,
    pub is_monotonic: Option<bool>,
    pub sample_count: u64,
    pub services: HashMap<String, u64>,
    pub label_keys: HashMap<String, KeyMetadataSnapshot>,
    pub resource_keys: HashMap<String, KeyMetadataSnapshot>,
    pub active_series_estimate: u64,
    pub histogram_bucket_bounds: Vec<f64>,
    pub exponential_histogram_scales: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_equals_sum_of_services() {
        let mut entry = MetricEntry::new("http_requests_total".into(), MetricKind::Sum, "1".into(), String::new());
        entry.record_service("api");
        entry.record_service("api");
        entry.record_service("worker");
        assert_eq!(entry.sample_count, 3);
        assert_eq!(entry.services.values().sum::<u64>(), entry.sample_count);
    }

    #[test]
    fn kind_mismatch_does_not_panic_or_mutate() {
        let entry = MetricEntry::new("x".into(), MetricKind::Gauge, String::new(), String::new());
        entry.check_kind(MetricKind::Sum);
        assert_eq!(entry.kind, MetricKind::Gauge);
    }
}
