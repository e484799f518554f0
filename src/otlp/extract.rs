//! Canonical string conversion for OTLP typed values (design §"Attribute
//! Extractor"). Grounded on `steveyackey-devrig`'s `extract_service_name`
//! / `convert_attributes` helpers, generalized to the full `AnyValue`
//! variant set (arrays and kvlists included) instead of a "first N,
//! complex values dropped" shortcut.

use super::proto::{AnyValueKind, KeyValue, Resource};

/// Convert one OTLP `AnyValue` to its canonical textual form. Scalars use
/// their natural representation; arrays and kvlists use a stable,
/// deterministic join so that two structurally-identical values always
/// produce the same string (needed for series fingerprinting and
/// cardinality sampling).
pub fn value_to_string(value: &AnyValueKind) -> String {
    match value {
        AnyValueKind::StringValue(s) => s.clone(),
        AnyValueKind::BoolValue(b) => b.to_string(),
        AnyValueKind::IntValue(i) => i.to_string(),
        AnyValueKind::DoubleValue(d) => format_double(*d),
        AnyValueKind::BytesValue(b) => hex_encode(b),
        AnyValueKind::ArrayValue(arr) => {
            let items: Vec<String> = arr
                .values
                .iter()
                .map(|v| v.value.as_ref().map(value_to_string).unwrap_or_default())
                .collect();
            format!("[{}]", items.join(","))
        }
        AnyValueKind::KvlistValue(kv) => {
            let mut items: Vec<String> = kv
                .values
                .iter()
                .map(|kv| {
                    let v = kv.value.as_ref().and_then(|v| v.value.as_ref()).map(value_to_string).unwrap_or_default();
                    format!("{}={}", kv.key, v)
                })
                .collect();
            items.sort();
            format!("{{{}}}", items.join(","))
        }
    }
}

fn format_double(d: f64) -> String {
    if d.fract() == 0.0 && d.abs() < 1e15 {
        format!("{}", d as i64)
    } else {
        d.to_string()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Extract and canonicalize every key/value pair in a `KeyValue` slice,
/// skipping keys whose value is entirely absent (a malformed sub-record,
/// per the design's "per-sub-record extraction error: logged, skipped").
pub fn flatten_attributes(attrs: &[KeyValue]) -> Vec<(String, String)> {
    attrs
        .iter()
        .filter_map(|kv| {
            let value = kv.value.as_ref()?.value.as_ref()?;
            Some((kv.key.clone(), value_to_string(value)))
        })
        .collect()
}

/// Resolve the service name for a resource: `service.name`, falling back
/// to `host.name`, falling back to `"unknown"`.
pub fn service_name(resource: Option<&Resource>) -> String {
    let Some(resource) = resource else {
        return "unknown".to_string();
    };
    let attrs = flatten_attributes(&resource.attributes);
    let lookup = |key: &str| attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
    lookup("service.name")
        .or_else(|| lookup("host.name"))
        .unwrap_or_else(|| "unknown".to_string())
}

/// A stable `key=value` join of a sorted attribute set, used both for the
/// series fingerprint input and anywhere a deterministic representation of
/// an attribute set is needed.
pub fn stable_kv_join(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}
