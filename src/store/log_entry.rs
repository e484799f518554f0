//! Log entry: unique by `(serviceName, severityText)` (design §4.5).

use std::collections::HashMap;

use serde::Serialize;

use crate::keymeta::{KeyMetadata, KeyMetadataSnapshot};
use crate::template_miner::Template;

pub const UNSET_SEVERITY: &str = "UNSET";

#[derive(Debug, Clone, Serialize)]
pub struct BodyTemplateSnapshot {
    pub template: String,
    pub count: u64,
    pub percentage: f64,
    pub example: String,
}

pub struct LogEntry {
    pub service_name: String,
    pub severity_text: String,
    pub sample_count: u64,
    pub services: HashMap<String, u64>,
    pub attribute_keys: HashMap<String, KeyMetadata>,
    pub resource_keys: HashMap<String, KeyMetadata>,
    pub body_templates: Vec<BodyTemplateSnapshot>,
}

impl LogEntry {
    pub fn new(service_name: String, severity_text: String) -> Self {
        Self {
            service_name,
            severity_text,
            sample_count: 0,
            services: HashMap::new(),
            attribute_keys: HashMap::new(),
            resource_keys: HashMap::new(),
            body_templates: Vec::new(),
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

    /// Overwrite `body_templates` with `templates`, sorted by count
    /// descending (design §4.5). The caller is responsible for passing a
    /// severity-scoped template list — this entry has no way to tell a
    /// cross-severity snapshot from a correct one.
    pub fn refresh_body_templates(&mut self, templates: &[Template], total_messages: u64) {
        self.body_templates = templates
            .iter()
            .map(|t| BodyTemplateSnapshot {
                template: t.rendered(),
                count: t.size,
                percentage: if total_messages == 0 { 0.0 } else { t.size as f64 / total_messages as f64 * 100.0 },
                example: t.example.clone(),
            })
            .collect();
        self.body_templates.sort_by(|a, b| b.count.cmp(&a.count));
    }

    pub fn snapshot(&self) -> LogEntrySnapshot {
        let key_snapshot = |m: &HashMap<String, KeyMetadata>| -> HashMap<String, KeyMetadataSnapshot> {
            m.iter().map(|(k, v)| (k.clone(), v.snapshot(self.sample_count))).collect()
        };
        LogEntrySnapshot {
            service_name: self.service_name.clone(),
            severity_text: self.severity_text.clone(),
            sample_count: self.sample_count,
            services: self.services.clone(),
            attribute_keys: key_snapshot(&self.attribute_keys),
            resource_keys: key_snapshot(&self.resource_keys),
            body_templates: self.body_templates.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntrySnapshot {
    pub service_name: String,
    pub severity_text: String,
    pub sample_count: u64,
    pub services: HashMap<String, u64>,
    pub attribute_keys: HashMap<String, KeyMetadataSnapshot>,
    pub resource_keys: HashMap<String, KeyMetadataSnapshot>,
    pub body_templates: Vec<BodyTemplateSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_templates_sort_by_count_descending() {
        let mut entry = LogEntry::new("api".into(), "INFO".into());
        let templates = vec![
            Template { tokens: vec!["a".into()], size: 2, example: "a".into() },
            Template { tokens: vec!["b".into()], size: 9, example: "b".into() },
        ];
        entry.refresh_body_templates(&templates, 11);
        assert_eq!(entry.body_templates[0].count, 9);
        assert_eq!(entry.body_templates[1].count, 2);
    }

    #[test]
    fn severity_defaults_to_unset_constant() {
        assert_eq!(UNSET_SEVERITY, "UNSET");
    }
}
