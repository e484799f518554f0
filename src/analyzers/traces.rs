//! Traces analyzer (design §4.4).

use crate::otlp::proto::{ExportTraceServiceRequest, ResourceSpans};
use crate::otlp::{extract, Scope, SignalType};
use crate::pattern_masker::PatternMasker;
use crate::store::{AttrKey, Store};

pub fn analyze(store: &Store, masker: &PatternMasker, request: &ExportTraceServiceRequest, max_samples: usize) {
    for resource_spans in &request.resource_spans {
        analyze_resource(store, masker, resource_spans, max_samples);
    }
}

fn analyze_resource(store: &Store, masker: &PatternMasker, resource_spans: &ResourceSpans, max_samples: usize) {
    let service = extract::service_name(resource_spans.resource.as_ref());
    let resource_attrs = resource_spans
        .resource
        .as_ref()
        .map(|r| extract::flatten_attributes(&r.attributes))
        .unwrap_or_default();

    for scope_spans in &resource_spans.scope_spans {
        for span in &scope_spans.spans {
            let entry = store.get_or_create_span(&span.name, span.kind);
            let attrs = extract::flatten_attributes(&span.attributes);
            let link_attrs: Vec<(String, String)> = span
                .links
                .iter()
                .flat_map(|l| extract::flatten_attributes(&l.attributes))
                .collect();
            let event_attrs: Vec<(String, String)> = span
                .events
                .iter()
                .flat_map(|ev| extract::flatten_attributes(&ev.attributes))
                .collect();

            {
                let mut e = entry.lock().expect("span entry lock poisoned");
                e.record_service(&service);
                for (k, v) in &attrs {
                    e.observe_attribute(max_samples, k, v);
                }
                for (k, v) in &resource_attrs {
                    e.observe_resource(max_samples, k, v);
                }
                for (k, v) in &link_attrs {
                    e.observe_link_attribute(max_samples, k, v);
                }
                for event in &span.events {
                    let event_attrs = extract::flatten_attributes(&event.attributes);
                    e.observe_event(max_samples, &event.name, &event_attrs);
                }
                e.has_trace_state |= !span.trace_state.is_empty();
                e.has_parent_span_id |= !span.parent_span_id.is_empty();
                if let Some(status) = &span.status {
                    e.status_codes.insert(status.code);
                }
                e.dropped_attributes.record(span.dropped_attributes_count);
                e.dropped_events.record(span.dropped_events_count);
                e.dropped_links.record(span.dropped_links_count);
            }

            let scoped = attrs
                .iter()
                .map(|(k, v)| (k, v, Scope::Attribute))
                .chain(resource_attrs.iter().map(|(k, v)| (k, v, Scope::Resource)))
                .chain(link_attrs.iter().map(|(k, v)| (k, v, Scope::Link)))
                .chain(event_attrs.iter().map(|(k, v)| (k, v, Scope::Event)));
            for (k, v, scope) in scoped {
                store.attribute_catalog.record(AttrKey {
                    key: k.clone(),
                    value: v.clone(),
                    signal_type: SignalType::Span,
                    scope,
                    service_name: service.clone(),
                });
            }

            record_span_pattern(store, masker, &span.name);
        }
    }
}

/// Mines span names into a masked template and keys a separate patterns
/// table, independent of the per-span-name entry above (design §4.4's
/// "second path").
fn record_span_pattern(store: &Store, masker: &PatternMasker, span_name: &str) {
    let template = masker.mask(span_name);
    let pattern = store.get_or_create_span_pattern(&template);
    pattern.lock().expect("span pattern lock poisoned").record(span_name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otlp::proto::{ResourceSpans, ScopeSpans, Span};

    fn span_request(names: &[&str]) -> ExportTraceServiceRequest {
        ExportTraceServiceRequest {
            resource_spans: vec![ResourceSpans {
                resource: None,
                scope_spans: vec![ScopeSpans {
                    scope: None,
                    spans: names
                        .iter()
                        .map(|name| Span {
                            trace_id: Vec::new(),
                            span_id: Vec::new(),
                            trace_state: String::new(),
                            parent_span_id: Vec::new(),
                            flags: 0,
                            name: name.to_string(),
                            kind: 0,
                            start_time_unix_nano: 0,
                            end_time_unix_nano: 0,
                            attributes: Vec::new(),
                            dropped_attributes_count: 0,
                            events: Vec::new(),
                            dropped_events_count: 0,
                            links: Vec::new(),
                            dropped_links_count: 0,
                            status: None,
                        })
                        .collect(),
                    schema_url: String::new(),
                }],
                schema_url: String::new(),
            }],
        }
    }

    #[test]
    fn span_name_pattern_matches_scenario_four() {
        let store = Store::new(100, 10_000);
        let masker = PatternMasker::new();
        analyze(&store, &masker, &span_request(&["GET /users/1", "GET /users/2", "GET /users/3"]), 100);

        let patterns = store.span_patterns();
        assert_eq!(patterns.len(), 1);
        let snapshot = patterns[0].lock().unwrap().snapshot(3);
        assert_eq!(snapshot.template, "GET <URL>");
        assert_eq!(snapshot.count, 3);
        assert_eq!(snapshot.examples.len(), 3);
    }
}
