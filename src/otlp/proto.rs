//! Re-exports over `opentelemetry-proto`'s generated tonic/prost types.
//!
//! This is the wire model for the receiver and attribute extractor: rather
//! than hand-rolling `.proto` files and a `build.rs`, the crate depends on
//! `opentelemetry-proto` with the `gen-tonic`, `metrics`, `trace`, `logs`,
//! and `with-serde` features, which is the same approach the OTLP-facing
//! examples in the retrieval pack take (e.g. `pixie79-otlp-rust-service`,
//! `yairfalse-urpo`, `runmat-org-otell`). `with-serde` means the very same
//! prost structs implement `serde::{Serialize, Deserialize}`, so OTLP JSON
//! decoding is `serde_json::from_slice::<ExportMetricsServiceRequest>` with
//! no bespoke JSON-to-protobuf conversion layer.

pub use opentelemetry_proto::tonic::collector::logs::v1::{
    logs_service_server::{LogsService, LogsServiceServer},
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
pub use opentelemetry_proto::tonic::collector::metrics::v1::{
    metrics_service_server::{MetricsService, MetricsServiceServer},
    ExportMetricsServiceRequest, ExportMetricsServiceResponse,
};
pub use opentelemetry_proto::tonic::collector::trace::v1::{
    trace_service_server::{TraceService, TraceServiceServer},
    ExportTraceServiceRequest, ExportTraceServiceResponse,
};

pub use opentelemetry_proto::tonic::common::v1::{
    any_value::Value as AnyValueKind, AnyValue, InstrumentationScope, KeyValue,
};
pub use opentelemetry_proto::tonic::logs::v1::{LogRecord, ResourceLogs, ScopeLogs};
pub use opentelemetry_proto::tonic::metrics::v1::{
    exponential_histogram_data_point::Buckets as ExpHistogramBuckets, metric::Data as MetricData,
    number_data_point::Value as NumberValue, ExponentialHistogram, ExponentialHistogramDataPoint,
    Gauge, Histogram, HistogramDataPoint, Metric, NumberDataPoint, ResourceMetrics, ScopeMetrics,
    Sum, Summary, SummaryDataPoint,
};
pub use opentelemetry_proto::tonic::resource::v1::Resource;
pub use opentelemetry_proto::tonic::trace::v1::{
    span::{Event as SpanEvent, Link as SpanLink, SpanKind},
    status::StatusCode as SpanStatusCode,
    ResourceSpans, ScopeSpans, Span,
};
