//! Span entry: unique by span name (design §"Data Model" / §4.4).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::keymeta::{KeyMetadata, KeyMetadataSnapshot};

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct DroppedStats {
    pub total: u64,
    pub max: u32,
    pub items_with_dropped: u64,
}

impl DroppedStats {
    pub fn record(&mut self, dropped: u32) {
        if dropped == 0 {
            return;
        }
        self.total += dropped as u64;
        self.max = self.max.max(dropped);
        self.items_with_dropped += 1;
    }
}

#[derive(Default)]
pub struct EventStats {
    pub count: u64,
    pub attribute_keys: HashMap<String, KeyMetadata>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventStatsSnapshot {
    pub count: u64,
    pub attribute_keys: HashMap<String, KeyMetadataSnapshot>,
}

pub struct SpanEntry {
    pub name: String,
    /// Raw OTLP `SpanKind` discriminant, pinned on creation.
    pub kind: i32,
    pub sample_count: u64,
    pub services: HashMap<String, u64>,
    pub attribute_keys: HashMap<String, KeyMetadata>,
    pub resource_keys: HashMap<String, KeyMetadata>,
    pub link_attribute_keys: HashMap<String, KeyMetadata>,
    pub events: HashMap<String, EventStats>,
    pub status_codes: HashSet<i32>,
    pub has_trace_state: bool,
    pub has_parent_span_id: bool,
    pub dropped_attributes: DroppedStats,
    pub dropped_events: DroppedStats,
    pub dropped_links: DroppedStats,
}

impl SpanEntry {
    pub fn new(name: String, kind: i32) -> Self {
        Self {
            name,
            kind,
            sample_count: 0,
            services: HashMap::new(),
            attribute_keys: HashMap::new(),
            resource_keys: HashMap::new(),
            link_attribute_keys: HashMap::new(),
            events: HashMap::new(),
            status_codes: HashSet::new(),
            has_trace_state: false,
            has_parent_span_id: false,
            dropped_attributes: DroppedStats::default(),
            dropped_events: DroppedStats::default(),
            dropped_links: DroppedStats::default(),
        }
    }

    pub fn record_service(&mut self, service: &str) {
        self.sample_count += 1;
        *self.services.entry(service.to_string()).or_insert(0) += 1;
    }

    pub fn observe_attribute(&mut self, max_samples: usize, key: &str, value: &str) {
        self.attribute_keys
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

    pub fn observe_link_attribute(&mut self, max_samples: usize, key: &str, value: &str) {
        self.link_attribute_keys
            .entry(key.to_string())
            .or_insert_with(|| KeyMetadata::new(max_samples))
            .add_value(value);
    }

    pub fn observe_event(&mut self, max_samples: usize, event_name: &str, attrs: &[(String, String)]) {
        let event = self.events.entry(event_name.to_string()).or_default();
        event.count += 1;
        for (k, v) in attrs {
            event
                .attribute_keys
                .entry(k.clone())
                .or_insert_with(|| KeyMetadata::new(max_samples))
                .add_value(v);
        }
    }

    pub fn snapshot(&self) -> SpanEntrySnapshot {
        let key_snapshot = |m: &HashMap<String, KeyMetadata>| -> HashMap<String, KeyMetadataSnapshot> {
            m.iter().map(|(k, v)| (k.clone(), v.snapshot(self.sample_count))).collect()
        };
        let events = self
            .events
            .iter()
            .map(|(name, stats)| {
                (
                    name.clone(),
                    EventStatsSnapshot {
                        count: stats.count,
                        attribute_keys: stats
                            .attribute_keys
                            .iter()
                            .map(|(k, v)| (k.clone(), v.snapshot(stats.count)))
                            .collect(),
                    },
                )
            })
            .collect();
        SpanEntrySnapshot {
            name: self.name.clone(),
            kind: self.kind,
            sample_count: self.sample_count,
            services: self.services.clone(),
            attribute_keys: key_snapshot(&self.attribute_keys),
            resource_keys: key_snapshot(&self.resource_keys),
            link_attribute_keys: key_snapshot(&self.link_attribute_keys),
            events,
            status_codes: self.status_codes.iter().copied().collect(),
            has_trace_state: self.has_trace_state,
            has_parent_span_id: self.has_parent_span_id,
            dropped_attributes: self.dropped_attributes,
            dropped_events: self.dropped_events,
            dropped_links: self.dropped_links,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpanEntrySnapshot {
    pub name: String,
    pub kind: i32,
    pub sample_count: u64,
    pub services: HashMap<String, u64>,
    pub attribute_keys: HashMap<String, KeyMetadataSnapshot>,
    pub resource_keys: HashMap<String, KeyMetadataSnapshot>,
    pub link_attribute_keys: HashMap<String, KeyMetadataSnapshot>,
    pub events: HashMap<String, EventStatsSnapshot>,
    pub status_codes: Vec<i32>,
    pub has_trace_state: bool,
    pub has_parent_span_id: bool,
    pub dropped_attributes: DroppedStats,
    pub dropped_events: DroppedStats,
    pub dropped_links: DroppedStats,
}

/// A mined span-name pattern: the masked template, how many spans matched
/// it, and up to 3 distinct unmasked examples (design §4.4 second path).
pub struct SpanPattern {
    pub template: String,
    pub count: u64,
    pub examples: indexmap::IndexSet<String>,
}

impl SpanPattern {
    const MAX_EXAMPLES: usize = 3;

    pub fn new(template: String) -> Self {
        Self {
            template,
            count: 0,
            examples: indexmap::IndexSet::new(),
        }
    }

    pub fn record(&mut self, original_name: &str) {
        self.count += 1;
        if self.examples.len() < Self::MAX_EXAMPLES {
            self.examples.insert(original_name.to_string());
        }
    }

    pub fn snapshot(&self, total: u64) -> SpanPatternSnapshot {
        SpanPatternSnapshot {
            template: self.template.clone(),
            count: self.count,
            percentage: if total == 0 { 0.0 } else { self.count as f64 / total as f64 * 100.0 },
            examples: self.examples.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpanPatternSnapshot {
    pub template: String,
    pub count: u64,
    pub percentage: f64,
    pub examples: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_stats_ignore_zero() {
        let mut stats = DroppedStats::default();
        stats.record(0);
        assert_eq!(stats.items_with_dropped, 0);
        stats.record(3);
        stats.record(5);
        assert_eq!(stats.total, 8);
        assert_eq!(stats.max, 5);
        assert_eq!(stats.items_with_dropped, 2);
    }

    #[test]
    fn span_pattern_caps_examples_at_three() {
        let mut pattern = SpanPattern::new("GET <URL>".into());
        for i in 0..5 {
            pattern.record(&format!("GET /users/{i}"));
        }
        assert_eq!(pattern.count, 5);
        assert_eq!(pattern.examples.len(), 3);
    }
}
