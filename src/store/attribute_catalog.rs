//! Attribute catalog: the only place raw values are retained (design §7's
//! cardinality-safety contract), so its size is bounded by a capacity
//! instead of growing without limit.

use std::sync::Mutex;

use indexmap::IndexMap;
use serde::Serialize;

use crate::otlp::{Scope, SignalType};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AttrKey {
    pub key: String,
    pub value: String,
    pub signal_type: SignalType,
    pub scope: Scope,
    pub service_name: String,
}

/// `IndexMap` instead of `HashMap` so eviction can drop the oldest entry in
/// insertion order — a first-in-first-out approximation of LRU, cheap to
/// maintain and sufficient for the "don't grow unbounded" requirement; a
/// true recency-tracking LRU would need a second index per touch.
pub struct AttributeCatalog {
    entries: Mutex<IndexMap<AttrKey, u64>>,
    capacity: usize,
}

impl AttributeCatalog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            capacity,
        }
    }

    /// Record one observation of `key`; inserts at capacity-cap, evicting
    /// the oldest entry if a brand new key would exceed it.
    pub fn record(&self, key: AttrKey) {
        let mut entries = self.entries.lock().expect("attribute catalog lock poisoned");
        if let Some(count) = entries.get_mut(&key) {
            *count += 1;
            return;
        }
        if entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(key, 1);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("attribute catalog lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<(AttrKey, u64)> {
        self.entries
            .lock()
            .expect("attribute catalog lock poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
