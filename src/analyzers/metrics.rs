//! Metrics analyzer (design §4.3).

use crate::otlp::proto::{ExportMetricsServiceRequest, MetricData, ResourceMetrics};
use crate::otlp::{extract, Scope, SignalType};
use crate::store::{AttrKey, MetricEntry, MetricKind, Store};

use super::fingerprint;

pub fn analyze(store: &Store, request: &ExportMetricsServiceRequest, max_samples: usize) {
    for resource_metrics in &request.resource_metrics {
        analyze_resource(store, resource_metrics, max_samples);
    }
}

fn analyze_resource(store: &Store, resource_metrics: &ResourceMetrics, max_samples: usize) {
    let service = extract::service_name(resource_metrics.resource.as_ref());
    let resource_attrs = resource_metrics
        .resource
        .as_ref()
        .map(|r| extract::flatten_attributes(&r.attributes))
        .unwrap_or_default();

    for scope_metrics in &resource_metrics.scope_metrics {
        for metric in &scope_metrics.metrics {
            let Some(data) = &metric.data else {
                tracing::warn!(metric = %metric.name, "metric has no data, skipping");
                continue;
            };
            let kind = match data {
                MetricData::Gauge(_) => MetricKind::Gauge,
                MetricData::Sum(_) => MetricKind::Sum,
                MetricData::Histogram(_) => MetricKind::Histogram,
                MetricData::ExponentialHistogram(_) => MetricKind::ExponentialHistogram,
                MetricData::Summary(_) => MetricKind::Summary,
            };
            let entry = store.get_or_create_metric(&metric.name, kind, &metric.unit, &metric.description);
            entry.lock().expect("metric entry lock poisoned").check_kind(kind);

            match data {
                MetricData::Gauge(g) => {
                    for dp in &g.data_points {
                        let attrs = extract::flatten_attributes(&dp.attributes);
                        record_point(store, &entry, &service, &attrs, &resource_attrs, max_samples);
                    }
                }
                MetricData::Sum(s) => {
                    for dp in &s.data_points {
                        let attrs = extract::flatten_attributes(&dp.attributes);
                        record_point(store, &entry, &service, &attrs, &resource_attrs, max_samples);
                    }
                    entry.lock().expect("metric entry lock poisoned").set_monotonic(s.is_monotonic);
                }
                MetricData::Histogram(h) => {
                    for dp in &h.data_points {
                        let attrs = extract::flatten_attributes(&dp.attributes);
                        record_point(store, &entry, &service, &attrs, &resource_attrs, max_samples);
                        let mut e = entry.lock().expect("metric entry lock poisoned");
                        for bound in &dp.explicit_bounds {
                            e.add_histogram_bound(*bound);
                        }
                    }
                }
                MetricData::ExponentialHistogram(eh) => {
                    for dp in &eh.data_points {
                        let attrs = extract::flatten_attributes(&dp.attributes);
                        record_point(store, &entry, &service, &attrs, &resource_attrs, max_samples);
                        entry.lock().expect("metric entry lock poisoned").add_exponential_scale(dp.scale);
                    }
                }
                MetricData::Summary(s) => {
                    for dp in &s.data_points {
                        let attrs = extract::flatten_attributes(&dp.attributes);
                        record_point(store, &entry, &service, &attrs, &resource_attrs, max_samples);
                    }
                }
            }
        }
    }
}

/// Common per-data-point work: service/sample counting, label and resource
/// key tracking, the attribute catalog, and the series fingerprint.
/// Resource attributes are recorded once per data point, not once per
/// metric (design §4.3 step 4).
fn record_point(
    store: &Store,
    entry: &std::sync::Mutex<MetricEntry>,
    service: &str,
    attrs: &[(String, String)],
    resource_attrs: &[(String, String)],
    max_samples: usize,
) {
    {
        let mut e = entry.lock().expect("metric entry lock poisoned");
        e.record_service(service);
        for (k, v) in attrs {
            e.observe_label(max_samples, k, v);
        }
        for (k, v) in resource_attrs {
            e.observe_resource(max_samples, k, v);
        }
        e.add_fingerprint(fingerprint(attrs));
    }
    for (k, v) in attrs {
        store.attribute_catalog.record(AttrKey {
            key: k.clone(),
            value: v.clone(),
            signal_type: SignalType::Metric,
            scope: Scope::Label,
            service_name: service.to_string(),
        });
    }
    for (k, v) in resource_attrs {
        store.attribute_catalog.record(AttrKey {
            key: k.clone(),
            value: v.clone(),
            signal_type: SignalType::Metric,
            scope: Scope::Resource,
            service_name: service.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otlp::proto::{
        AnyValue, AnyValueKind, KeyValue, Metric, NumberDataPoint, NumberValue, Resource,
        ResourceMetrics, ScopeMetrics, Sum,
    };

    fn sv(s: &str) -> Option<AnyValue> {
        Some(AnyValue { value: Some(AnyValueKind::StringValue(s.to_string())) })
    }

    fn counter_request() -> ExportMetricsServiceRequest {
        ExportMetricsServiceRequest {
            resource_metrics: vec![ResourceMetrics {
                resource: Some(Resource {
                    attributes: vec![KeyValue { key: "service.name".into(), value: sv("api") }],
                    dropped_attributes_count: 0,
                    entity_refs: vec![],
                }),
                scope_metrics: vec![ScopeMetrics {
                    scope: None,
                    schema_url: String::new(),
                    metrics: vec![Metric {
                        name: "http_requests_total".into(),
                        description: String::new(),
                        unit: String::new(),
                        metadata: Vec::new(),
                        data: Some(MetricData::Sum(Sum {
                            data_points: vec![NumberDataPoint {
                                attributes: vec![
                                    KeyValue { key: "method".into(), value: sv("GET") },
                                    KeyValue { key: "status".into(), value: sv("200") },
                                ],
                                start_time_unix_nano: 0,
                                time_unix_nano: 0,
                                exemplars: Vec::new(),
                                flags: 0,
                                value: Some(NumberValue::AsInt(1)),
                            }],
                            aggregation_temporality: 0,
                            is_monotonic: true,
                        })),
                    }],
                }],
                schema_url: String::new(),
            }],
        }
    }

    #[test]
    fn single_counter_matches_scenario_one() {
        let store = Store::new(100, 10_000);
        analyze(&store, &counter_request(), 100);

        let entry = store.get_metric("http_requests_total").expect("metric should exist");
        let entry = entry.lock().unwrap();
        assert_eq!(entry.sample_count, 1);
        assert_eq!(entry.services.get("api"), Some(&1));
        let method = entry.label_keys.get("method").expect("method key");
        assert_eq!(method.count(), 1);
        assert_eq!(method.snapshot(1).value_samples, vec!["GET".to_string()]);
        assert_eq!(entry.is_monotonic, Some(true));
    }

    #[test]
    fn replaying_request_doubles_counts() {
        let store = Store::new(100, 10_000);
        let request = counter_request();
        analyze(&store, &request, 100);
        analyze(&store, &request, 100);

        let entry = store.get_metric("http_requests_total").unwrap();
        let entry = entry.lock().unwrap();
        assert_eq!(entry.sample_count, 2);
        assert_eq!(entry.services.get("api"), Some(&2));
    }

    #[test]
    fn kind_mismatch_is_logged_not_mutated() {
        let store = Store::new(100, 10_000);
        analyze(&store, &counter_request(), 100);

        let mut gauge_request = counter_request();
        gauge_request.resource_metrics[0].scope_metrics[0].metrics[0].data =
            Some(MetricData::Gauge(crate::otlp::proto::Gauge { data_points: Vec::new() }));
        analyze(&store, &gauge_request, 100);

        let entry = store.get_metric("http_requests_total").unwrap();
        assert_eq!(entry.lock().unwrap().kind, MetricKind::Sum);
    }
}
