//! Per-key metadata shared by metric label/resource keys, span attribute
//! keys, and log attribute/resource keys (design §"Key Metadata & HLL").

use indexmap::IndexSet;
use serde::Serialize;

use crate::hll::HyperLogLog;

/// Observation counters, a bounded ordered value sample, and a cardinality
/// sketch for a single attribute key within one parent entry.
#[derive(Debug, Clone)]
pub struct KeyMetadata {
    count: u64,
    max_samples: usize,
    samples: IndexSet<String>,
    sketch: HyperLogLog,
}

impl KeyMetadata {
    pub fn new(max_samples: usize) -> Self {
        Self {
            count: 0,
            max_samples,
            samples: IndexSet::new(),
            sketch: HyperLogLog::new(),
        }
    }

    /// Record one observation of `value` for this key: increments `count`,
    /// inserts into the bounded sample set if there's room, and always
    /// feeds the cardinality sketch. O(1) amortized, no sorting.
    pub fn add_value(&mut self, value: &str) {
        self.count += 1;
        if self.samples.len() < self.max_samples {
            self.samples.insert(value.to_string());
        }
        self.sketch.add(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn percentage(&self, parent_sample_count: u64) -> f64 {
        if parent_sample_count == 0 {
            0.0
        } else {
            (self.count as f64 / parent_sample_count as f64) * 100.0
        }
    }

    /// `estimated_cardinality >= |value_samples|` always holds because we
    /// take the max of the sketch estimate and the exact sample count.
    pub fn estimated_cardinality(&self) -> u64 {
        self.sketch.estimate().max(self.samples.len() as u64)
    }

    pub fn value_samples_len(&self) -> usize {
        self.samples.len()
    }

    /// Snapshot for serialization: samples sorted for stable output, per
    /// the invariant that insertion order is preserved internally but
    /// serialization is deterministic.
    pub fn snapshot(&self, parent_sample_count: u64) -> KeyMetadataSnapshot {
        let mut samples: Vec<String> = self.samples.iter().cloned().collect();
        samples.sort();
        KeyMetadataSnapshot {
            count: self.count,
            percentage: self.percentage(parent_sample_count),
            estimated_cardinality: self.estimated_cardinality(),
            value_samples: samples,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyMetadataSnapshot {
    pub count: u64,
    pub percentage: f64,
    pub estimated_cardinality: u64,
    pub value_samples: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_cap_is_respected() {
        let mut km = KeyMetadata::new(100);
        for i in 0..150 {
            km.add_value(&format!("user-{i}"));
        }
        assert_eq!(km.count(), 150);
        assert_eq!(km.value_samples_len(), 100);
        let estimate = km.estimated_cardinality();
        assert!(
            (148..=155).contains(&estimate),
            "estimate {estimate} out of expected HLL error band"
        );
    }

    #[test]
    fn cardinality_never_below_sample_count() {
        let mut km = KeyMetadata::new(100);
        km.add_value("a");
        km.add_value("b");
        assert!(km.estimated_cardinality() >= km.value_samples_len() as u64);
    }

    #[test]
    fn percentage_is_bounded() {
        let mut km = KeyMetadata::new(10);
        for _ in 0..5 {
            km.add_value("x");
        }
        let pct = km.percentage(10);
        assert!((0.0..=100.0).contains(&pct));
        assert_eq!(pct, 50.0);
    }
}
