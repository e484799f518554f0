//! OTLP wire model and ingestion-side helpers.

pub mod extract;
pub mod proto;
pub mod receiver_grpc;
pub mod receiver_http;

/// Which OTLP signal a given observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Metric,
    Span,
    Log,
}

/// Where a key was observed within a signal, per the design's catalog scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Label,
    Resource,
    Attribute,
    Event,
    Link,
}
