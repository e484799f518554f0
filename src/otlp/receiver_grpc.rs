//! gRPC OTLP receiver (design §4.1): `tonic` services implementing
//! `MetricsService`/`TraceService`/`LogsService` on `config.otlp_grpc_addr`,
//! grounded on `yairfalse-urpo`'s `GrpcTraceService` shape — one impl struct
//! per service, each holding the same shared state the HTTP receiver uses.

use tonic::{Request, Response, Status};

use crate::analyzers;
use crate::error::AppError;
use crate::otlp::proto::{
    ExportLogsServiceRequest, ExportLogsServiceResponse, ExportMetricsServiceRequest,
    ExportMetricsServiceResponse, ExportTraceServiceRequest, ExportTraceServiceResponse,
    LogsService, LogsServiceServer, MetricsService, MetricsServiceServer, TraceService,
    TraceServiceServer,
};
use crate::AppState;

/// Builds the three tonic service impls wrapped in their respective
/// `*Server` adapters, ready to hand to `tonic::transport::Server`.
pub fn services(
    state: AppState,
) -> (MetricsServiceServer<GrpcMetricsService>, TraceServiceServer<GrpcTraceService>, LogsServiceServer<GrpcLogsService>) {
    (
        MetricsServiceServer::new(GrpcMetricsService { state: state.clone() }),
        TraceServiceServer::new(GrpcTraceService { state: state.clone() }),
        LogsServiceServer::new(GrpcLogsService { state }),
    )
}

pub struct GrpcMetricsService {
    state: AppState,
}

#[tonic::async_trait]
impl MetricsService for GrpcMetricsService {
    async fn export(
        &self,
        request: Request<ExportMetricsServiceRequest>,
    ) -> Result<Response<ExportMetricsServiceResponse>, Status> {
        let request = request.into_inner();
        analyzers::metrics::analyze(&self.state.store, &request, self.state.config.max_value_samples);
        Ok(Response::new(ExportMetricsServiceResponse { partial_success: None }))
    }
}

pub struct GrpcTraceService {
    state: AppState,
}

#[tonic::async_trait]
impl TraceService for GrpcTraceService {
    async fn export(
        &self,
        request: Request<ExportTraceServiceRequest>,
    ) -> Result<Response<ExportTraceServiceResponse>, Status> {
        let request = request.into_inner();
        analyzers::traces::analyze(
            &self.state.store,
            &self.state.pattern_masker,
            &request,
            self.state.config.max_value_samples,
        );
        Ok(Response::new(ExportTraceServiceResponse { partial_success: None }))
    }
}

pub struct GrpcLogsService {
    state: AppState,
}

#[tonic::async_trait]
impl LogsService for GrpcLogsService {
    async fn export(
        &self,
        request: Request<ExportLogsServiceRequest>,
    ) -> Result<Response<ExportLogsServiceResponse>, Status> {
        let request = request.into_inner();
        analyzers::logs::analyze(
            &self.state.store,
            &self.state.pattern_masker,
            &self.state.template_miner,
            &request,
            self.state.config.max_value_samples,
            self.state.config.enable_template_mining,
        );
        Ok(Response::new(ExportLogsServiceResponse { partial_success: None }))
    }
}

/// Surfaced for callers that want to map a decode/size failure the same way
/// the HTTP receiver does, should a gRPC interceptor ever need it.
#[allow(dead_code)]
fn to_status(err: AppError) -> Status {
    err.to_tonic_status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pattern_masker::PatternMasker;
    use crate::store::Store;
    use crate::template_miner::SeverityMiners;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(Store::new(100, 10_000)),
            template_miner: Arc::new(SeverityMiners::new(4, Default::default())),
            pattern_masker: Arc::new(PatternMasker::new()),
            config: Arc::new(Config::from_env()),
        }
    }

    #[tokio::test]
    async fn metrics_export_accepts_empty_request() {
        let service = GrpcMetricsService { state: test_state() };
        let response = service
            .export(Request::new(ExportMetricsServiceRequest { resource_metrics: Vec::new() }))
            .await
            .unwrap();
        assert!(response.into_inner().partial_success.is_none());
    }

    #[tokio::test]
    async fn traces_export_accepts_empty_request() {
        let service = GrpcTraceService { state: test_state() };
        let response = service
            .export(Request::new(ExportTraceServiceRequest { resource_spans: Vec::new() }))
            .await
            .unwrap();
        assert!(response.into_inner().partial_success.is_none());
    }

    #[tokio::test]
    async fn logs_export_accepts_empty_request() {
        let service = GrpcLogsService { state: test_state() };
        let response = service
            .export(Request::new(ExportLogsServiceRequest { resource_logs: Vec::new() }))
            .await
            .unwrap();
        assert!(response.into_inner().partial_success.is_none());
    }
}
