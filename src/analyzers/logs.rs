//! Logs analyzer (design §4.5).

use std::collections::HashSet;

use crate::otlp::proto::{AnyValueKind, ExportLogsServiceRequest, ResourceLogs};
use crate::otlp::{extract, Scope, SignalType};
use crate::pattern_masker::PatternMasker;
use crate::store::log_entry::UNSET_SEVERITY;
use crate::store::{AttrKey, Store};
use crate::template_miner::SeverityMiners;

pub fn analyze(
    store: &Store,
    masker: &PatternMasker,
    miners: &SeverityMiners,
    request: &ExportLogsServiceRequest,
    max_samples: usize,
    enable_mining: bool,
) {
    let mut touched: HashSet<(String, String)> = HashSet::new();
    for resource_logs in &request.resource_logs {
        analyze_resource(store, masker, miners, resource_logs, max_samples, enable_mining, &mut touched);
    }
    if !enable_mining {
        return;
    }
    // Refresh body templates once per (service, severity) touched by this
    // batch, after all records have been mined (design §4.5 "on batch
    // completion"). Each severity gets its own `templates()`/
    // `total_messages()` snapshot from its own miner, so a batch mixing
    // severities never writes one severity's clusters into another's entry.
    let severities: HashSet<&str> = touched.iter().map(|(_, severity)| severity.as_str()).collect();
    for severity in severities {
        let miner = miners.get_or_create(severity);
        let templates = miner.templates();
        let total_messages = miner.total_messages();
        for (service, entry_severity) in touched.iter().filter(|(_, s)| s == severity) {
            if let Some(entry) = store.get_log(service, entry_severity) {
                entry.lock().expect("log entry lock poisoned").refresh_body_templates(&templates, total_messages);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn analyze_resource(
    store: &Store,
    masker: &PatternMasker,
    miners: &SeverityMiners,
    resource_logs: &ResourceLogs,
    max_samples: usize,
    enable_mining: bool,
    touched: &mut HashSet<(String, String)>,
) {
    let service = extract::service_name(resource_logs.resource.as_ref());
    let resource_attrs = resource_logs
        .resource
        .as_ref()
        .map(|r| extract::flatten_attributes(&r.attributes))
        .unwrap_or_default();

    for scope_logs in &resource_logs.scope_logs {
        for record in &scope_logs.log_records {
            let severity = if record.severity_text.is_empty() {
                UNSET_SEVERITY.to_string()
            } else {
                record.severity_text.clone()
            };
            let entry = store.get_or_create_log(&service, &severity);
            let attrs = extract::flatten_attributes(&record.attributes);

            {
                let mut e = entry.lock().expect("log entry lock poisoned");
                e.record_service(&service);
                for (k, v) in &attrs {
                    e.observe_attribute(max_samples, k, v);
                }
                for (k, v) in &resource_attrs {
                    e.observe_resource(max_samples, k, v);
                }
            }

            let scoped =
                attrs.iter().map(|(k, v)| (k, v, Scope::Attribute)).chain(resource_attrs.iter().map(|(k, v)| (k, v, Scope::Resource)));
            for (k, v, scope) in scoped {
                store.attribute_catalog.record(AttrKey {
                    key: k.clone(),
                    value: v.clone(),
                    signal_type: SignalType::Log,
                    scope,
                    service_name: service.clone(),
                });
            }

            if enable_mining {
                if let Some(body) = record.body.as_ref().and_then(|b| b.value.as_ref()) {
                    if let AnyValueKind::StringValue(text) = body {
                        if !text.is_empty() {
                            let masked = masker.mask(text);
                            miners.get_or_create(&severity).train(text, &masked);
                            touched.insert((service.clone(), severity.clone()));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otlp::proto::{AnyValue, LogRecord, ResourceLogs, ScopeLogs};

    fn log_request(bodies: &[&str], severity: &str) -> ExportLogsServiceRequest {
        ExportLogsServiceRequest {
            resource_logs: vec![ResourceLogs {
                resource: None,
                scope_logs: vec![ScopeLogs {
                    scope: None,
                    log_records: bodies
                        .iter()
                        .map(|body| LogRecord {
                            time_unix_nano: 0,
                            observed_time_unix_nano: 0,
                            severity_number: 0,
                            severity_text: severity.to_string(),
                            body: Some(AnyValue { value: Some(AnyValueKind::StringValue(body.to_string())) }),
                            attributes: Vec::new(),
                            dropped_attributes_count: 0,
                            flags: 0,
                            trace_id: Vec::new(),
                            span_id: Vec::new(),
                            event_name: String::new(),
                        })
                        .collect(),
                    schema_url: String::new(),
                }],
                schema_url: String::new(),
            }],
        }
    }

    #[test]
    fn drain_clustering_matches_scenario_three() {
        let store = Store::new(100, 10_000);
        let masker = PatternMasker::new();
        let miners = SeverityMiners::new(4, Default::default());
        let request = log_request(&["user john logged in", "user jane logged in", "user bob logged in"], "INFO");

        analyze(&store, &masker, &miners, &request, 100, true);

        let entry = store.get_log("unknown", "INFO").expect("log entry for unknown service");
        let entry = entry.lock().unwrap();
        assert_eq!(entry.body_templates.len(), 1);
        assert_eq!(entry.body_templates[0].template, "user <*> logged in");
        assert_eq!(entry.body_templates[0].count, 3);
        assert_eq!(entry.body_templates[0].percentage, 100.0);
    }

    #[test]
    fn missing_severity_defaults_to_unset() {
        let store = Store::new(100, 10_000);
        let masker = PatternMasker::new();
        let miners = SeverityMiners::new(1, Default::default());
        let request = log_request(&["hello"], "");

        analyze(&store, &masker, &miners, &request, 100, true);

        assert!(store.get_log("unknown", UNSET_SEVERITY).is_some());
    }

    /// A single export mixing severities must not leak one severity's
    /// body templates into the other's entry (design §3's "per severity,
    /// aggregated across services" correlation).
    #[test]
    fn mixed_severity_batch_does_not_leak_templates_across_severities() {
        let store = Store::new(100, 10_000);
        let masker = PatternMasker::new();
        let miners = SeverityMiners::new(4, Default::default());

        let mut request = log_request(&["user alice logged in"], "INFO");
        request.resource_logs.extend(log_request(&["disk write failed"], "ERROR").resource_logs);

        analyze(&store, &masker, &miners, &request, 100, true);

        let info = store.get_log("unknown", "INFO").expect("INFO entry");
        let info = info.lock().unwrap();
        assert_eq!(info.body_templates.len(), 1);
        assert_eq!(info.body_templates[0].template, "user alice logged in");

        let error = store.get_log("unknown", "ERROR").expect("ERROR entry");
        let error = error.lock().unwrap();
        assert_eq!(error.body_templates.len(), 1);
        assert_eq!(error.body_templates[0].template, "disk write failed");
    }
}
