use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use cardinality_analyzer::config::Config;
use cardinality_analyzer::otlp::receiver_grpc;
use cardinality_analyzer::pattern_masker::PatternMasker;
use cardinality_analyzer::store::Store;
use cardinality_analyzer::template_miner::{MinerParams, SeverityMiners};
use cardinality_analyzer::{api, otlp, AppState};
use tonic::transport::Server as TonicServer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cardinality_analyzer=debug,tower_http=debug")))
        .init();

    let config = Config::from_env();

    let pattern_masker = match &config.pattern_config_path {
        Some(path) => PatternMasker::from_config_file(path)?,
        None => PatternMasker::new(),
    };

    let miner_params = MinerParams {
        max_depth: config.miner_max_depth,
        max_children: config.miner_max_children,
        sim_threshold: config.miner_sim_threshold,
        max_clusters_per_shard: config.miner_max_clusters_per_shard,
    };

    let state = AppState {
        store: Arc::new(Store::new(config.max_value_samples, config.max_catalog_entries)),
        template_miner: Arc::new(SeverityMiners::new(config.miner_shards, miner_params)),
        pattern_masker: Arc::new(pattern_masker),
        config: Arc::new(config),
    };

    let otlp_http_addr = state.config.otlp_http_addr;
    let otlp_grpc_addr = state.config.otlp_grpc_addr;
    let rest_api_addr = state.config.rest_api_addr;

    let otlp_http_app = otlp::receiver_http::router(state.clone())
        .with_state(state.clone())
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http());
    // API read path has a 60s per-request deadline; `Timeout` returns a
    // `REQUEST_TIMEOUT` response directly, so no error-to-response adapter
    // is needed.
    let rest_app = api::router()
        .with_state(state.clone())
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(60)));

    let (metrics_svc, trace_svc, logs_svc) = receiver_grpc::services(state.clone());

    tracing::info!(%otlp_http_addr, %otlp_grpc_addr, %rest_api_addr, "starting cardinality-analyzer");

    let otlp_http_listener = tokio::net::TcpListener::bind(otlp_http_addr).await?;
    let rest_listener = tokio::net::TcpListener::bind(rest_api_addr).await?;

    let otlp_http_server = axum::serve(otlp_http_listener, otlp_http_app);
    let rest_server = axum::serve(rest_listener, rest_app);
    let grpc_server = TonicServer::builder()
        .layer(CatchPanicLayer::new())
        .add_service(metrics_svc)
        .add_service(trace_svc)
        .add_service(logs_svc)
        .serve(otlp_grpc_addr);

    tokio::try_join!(
        async { otlp_http_server.await.map_err(anyhow::Error::from) },
        async { rest_server.await.map_err(anyhow::Error::from) },
        async { grpc_server.await.map_err(anyhow::Error::from) },
    )?;

    Ok(())
}
