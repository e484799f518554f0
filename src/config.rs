use std::net::SocketAddr;
use std::path::PathBuf;

/// Process-wide configuration, loaded once from the environment at startup.
///
/// Follows the teacher's `unwrap_or_else` style of falling back to a
/// hardcoded default rather than failing when a variable is unset; only a
/// present-but-malformed pattern-definitions file aborts startup (see
/// `pattern_masker::PatternMasker::from_config`).
#[derive(Debug, Clone)]
pub struct Config {
    pub otlp_http_addr: SocketAddr,
    pub otlp_grpc_addr: SocketAddr,
    pub rest_api_addr: SocketAddr,
    pub max_request_bytes: usize,
    pub enable_template_mining: bool,
    pub pattern_config_path: Option<PathBuf>,
    pub pprof_addr: Option<SocketAddr>,

    pub max_value_samples: usize,
    pub max_catalog_entries: usize,
    pub high_cardinality_threshold: u64,
    pub metadata_complexity_threshold: usize,

    pub miner_shards: usize,
    pub miner_max_depth: usize,
    pub miner_max_children: usize,
    pub miner_sim_threshold: f64,
    pub miner_max_clusters_per_shard: usize,
}

fn env_addr(name: &str, default: &str) -> SocketAddr {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| default.parse().expect("default address must be valid"))
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Config {
    /// Read configuration from environment variables, falling back to the
    /// documented defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            otlp_http_addr: env_addr("OTLP_HTTP_ADDR", "0.0.0.0:4318"),
            otlp_grpc_addr: env_addr("OTLP_GRPC_ADDR", "0.0.0.0:4317"),
            rest_api_addr: env_addr("REST_API_ADDR", "0.0.0.0:8080"),
            max_request_bytes: env_parse("OTLP_MAX_REQUEST_BYTES", 32 * 1024 * 1024),
            enable_template_mining: env_bool("ENABLE_LOG_TEMPLATE_MINING", true),
            pattern_config_path: std::env::var("PATTERN_DEFINITIONS_PATH").ok().map(PathBuf::from),
            pprof_addr: std::env::var("PPROF_ADDR").ok().and_then(|v| v.parse().ok()),

            max_value_samples: env_parse("MAX_VALUE_SAMPLES", 100),
            max_catalog_entries: env_parse("MAX_CATALOG_ENTRIES", 2_000_000),
            high_cardinality_threshold: env_parse("HIGH_CARDINALITY_THRESHOLD", 1000),
            metadata_complexity_threshold: env_parse("METADATA_COMPLEXITY_THRESHOLD", 20),

            miner_shards: env_parse("MINER_SHARDS", 4),
            miner_max_depth: env_parse("MINER_MAX_DEPTH", 4),
            miner_max_children: env_parse("MINER_MAX_CHILDREN", 100),
            miner_sim_threshold: env_parse("MINER_SIM_THRESHOLD", 0.7),
            miner_max_clusters_per_shard: env_parse("MINER_MAX_CLUSTERS_PER_SHARD", 1000),
        }
    }
}
