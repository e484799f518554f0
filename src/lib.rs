pub mod analyzers;
pub mod api;
pub mod config;
pub mod error;
pub mod hll;
pub mod keymeta;
pub mod otlp;
pub mod pattern_masker;
pub mod store;
pub mod template_miner;

use std::sync::Arc;

use config::Config;
use pattern_masker::PatternMasker;
use store::Store;
use template_miner::SeverityMiners;

/// Shared application state: one `Arc` each, cheap to clone per-request the
/// way the teacher's `AppState` clones its `Client` and `Arc<ConfigDb>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub template_miner: Arc<SeverityMiners>,
    pub pattern_masker: Arc<PatternMasker>,
    pub config: Arc<Config>,
}
