//! The process-wide concurrent aggregate (design §4.9).
//!
//! Four top-level maps, each behind its own `RwLock`; entries are
//! individually `Mutex`-guarded so the map lock is only ever held for
//! lookup/creation, never for the body of a mutation (§5's "minimal
//! critical section" directive). `Store` holds no analyzer logic itself —
//! analyzers borrow an entry's lock and call its mutation methods.

pub mod attribute_catalog;
pub mod log_entry;
pub mod metric_entry;
pub mod span_entry;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

pub use attribute_catalog::{AttrKey, AttributeCatalog};
pub use log_entry::LogEntry;
pub use metric_entry::{MetricEntry, MetricKind};
pub use span_entry::{SpanEntry, SpanPattern};

pub struct Store {
    metrics: RwLock<HashMap<String, Arc<Mutex<MetricEntry>>>>,
    spans: RwLock<HashMap<String, Arc<Mutex<SpanEntry>>>>,
    logs: RwLock<HashMap<(String, String), Arc<Mutex<LogEntry>>>>,
    span_patterns: RwLock<HashMap<String, Arc<Mutex<SpanPattern>>>>,
    pub attribute_catalog: AttributeCatalog,
    pub max_value_samples: usize,
}

impl Store {
    pub fn new(max_value_samples: usize, catalog_capacity: usize) -> Self {
        Self {
            metrics: RwLock::new(HashMap::new()),
            spans: RwLock::new(HashMap::new()),
            logs: RwLock::new(HashMap::new()),
            span_patterns: RwLock::new(HashMap::new()),
            attribute_catalog: AttributeCatalog::new(catalog_capacity),
            max_value_samples,
        }
    }

    pub fn get_or_create_metric(&self, name: &str, kind: MetricKind, unit: &str, description: &str) -> Arc<Mutex<MetricEntry>> {
        if let Some(entry) = self.metrics.read().expect("metrics map lock poisoned").get(name) {
            return Arc::clone(entry);
        }
        let mut metrics = self.metrics.write().expect("metrics map lock poisoned");
        Arc::clone(metrics.entry(name.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(MetricEntry::new(name.to_string(), kind, unit.to_string(), description.to_string())))
        }))
    }

    pub fn get_or_create_span(&self, name: &str, kind: i32) -> Arc<Mutex<SpanEntry>> {
        if let Some(entry) = self.spans.read().expect("spans map lock poisoned").get(name) {
            return Arc::clone(entry);
        }
        let mut spans = self.spans.write().expect("spans map lock poisoned");
        Arc::clone(spans.entry(name.to_string()).or_insert_with(|| Arc::new(Mutex::new(SpanEntry::new(name.to_string(), kind)))))
    }

    pub fn get_or_create_log(&self, service: &str, severity: &str) -> Arc<Mutex<LogEntry>> {
        let map_key = (service.to_string(), severity.to_string());
        if let Some(entry) = self.logs.read().expect("logs map lock poisoned").get(&map_key) {
            return Arc::clone(entry);
        }
        let mut logs = self.logs.write().expect("logs map lock poisoned");
        Arc::clone(
            logs.entry(map_key)
                .or_insert_with(|| Arc::new(Mutex::new(LogEntry::new(service.to_string(), severity.to_string())))),
        )
    }

    pub fn get_or_create_span_pattern(&self, template: &str) -> Arc<Mutex<SpanPattern>> {
        if let Some(entry) = self.span_patterns.read().expect("span patterns map lock poisoned").get(template) {
            return Arc::clone(entry);
        }
        let mut patterns = self.span_patterns.write().expect("span patterns map lock poisoned");
        Arc::clone(
            patterns
                .entry(template.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(SpanPattern::new(template.to_string())))),
        )
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.read().expect("metrics map lock poisoned").keys().cloned().collect()
    }

    pub fn get_metric(&self, name: &str) -> Option<Arc<Mutex<MetricEntry>>> {
        self.metrics.read().expect("metrics map lock poisoned").get(name).cloned()
    }

    pub fn span_names(&self) -> Vec<String> {
        self.spans.read().expect("spans map lock poisoned").keys().cloned().collect()
    }

    pub fn get_span(&self, name: &str) -> Option<Arc<Mutex<SpanEntry>>> {
        self.spans.read().expect("spans map lock poisoned").get(name).cloned()
    }

    pub fn log_keys(&self) -> Vec<(String, String)> {
        self.logs.read().expect("logs map lock poisoned").keys().cloned().collect()
    }

    pub fn get_log(&self, service: &str, severity: &str) -> Option<Arc<Mutex<LogEntry>>> {
        self.logs
            .read()
            .expect("logs map lock poisoned")
            .get(&(service.to_string(), severity.to_string()))
            .cloned()
    }

    pub fn span_patterns(&self) -> Vec<Arc<Mutex<SpanPattern>>> {
        self.span_patterns.read().expect("span patterns map lock poisoned").values().cloned().collect()
    }

    /// Union of every service name observed across the three signal maps
    /// (design §4.9's "services: set of serviceName (derived)").
    pub fn services(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        for entry in self.metrics.read().expect("metrics map lock poisoned").values() {
            seen.extend(entry.lock().expect("metric entry lock poisoned").services.keys().cloned());
        }
        for entry in self.spans.read().expect("spans map lock poisoned").values() {
            seen.extend(entry.lock().expect("span entry lock poisoned").services.keys().cloned());
        }
        for entry in self.logs.read().expect("logs map lock poisoned").values() {
            seen.extend(entry.lock().expect("log entry lock poisoned").services.keys().cloned());
        }
        let mut services: Vec<String> = seen.into_iter().collect();
        services.sort();
        services
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use std::thread;

    #[test]
    fn get_or_create_is_idempotent_by_name() {
        let store = Store::new(100, 1000);
        let a = store.get_or_create_metric("requests", MetricKind::Sum, "1", "");
        let b = store.get_or_create_metric("requests", MetricKind::Gauge, "1", "");
        assert!(StdArc::ptr_eq(&a, &b));
        assert_eq!(a.lock().unwrap().kind, MetricKind::Sum);
    }

    #[test]
    fn services_derives_union_across_maps() {
        let store = Store::new(100, 1000);
        store.get_or_create_metric("m", MetricKind::Gauge, "", "").lock().unwrap().record_service("api");
        store.get_or_create_span("s", 0).lock().unwrap().record_service("worker");
        let services = store.services();
        assert_eq!(services, vec!["api".to_string(), "worker".to_string()]);
    }

    #[test]
    fn concurrent_writers_lose_no_updates() {
        let store = StdArc::new(Store::new(100, 1000));
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = StdArc::clone(&store);
            handles.push(thread::spawn(move || {
                let entry = store.get_or_create_metric("concurrent", MetricKind::Sum, "", "");
                for _ in 0..100 {
                    entry.lock().unwrap().record_service("svc");
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        let entry = store.get_metric("concurrent").unwrap();
        assert_eq!(entry.lock().unwrap().sample_count, 5000);
    }
}
