//! Per-signal aggregation (design §4.3-§4.5): turns a decoded OTLP export
//! request into store mutations. No analyzer holds a pointer into the
//! store across request boundaries; each call here runs to completion
//! before returning.

pub mod logs;
pub mod metrics;
pub mod traces;

use std::hash::Hasher;

use twox_hash::XxHash64;

use crate::otlp::extract;

/// Stable hash over the sorted `key=value` attribute pairs of a data point
/// or span, used as the metrics series fingerprint (design §4.3 step 5).
/// Invariant under attribute insertion order because `stable_kv_join`
/// sorts before joining.
pub fn fingerprint(attrs: &[(String, String)]) -> u64 {
    let joined = extract::stable_kv_join(attrs);
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(joined.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_order_independent() {
        let a = vec![("method".to_string(), "GET".to_string()), ("status".to_string(), "200".to_string())];
        let b = vec![("status".to_string(), "200".to_string()), ("method".to_string(), "GET".to_string())];
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }
}
