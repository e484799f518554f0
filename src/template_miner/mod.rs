//! Sharded, fixed-depth Drain-style template miner (design §"Template
//! Miner (Drain-style)"). Groups similar tokenized strings ("user 42
//! logged in", "user 17 logged in") into one template ("user <*> logged
//! in") without ever storing the raw strings beyond one example per
//! cluster.
//!
//! This is the one module with no direct corpus analogue: none of the
//! retrieved example repos ship a Drain-style clusterer, so the tree,
//! tokenizer, and similarity function below are implemented directly from
//! the algorithm description rather than adapted from an existing file.

mod tokenize;
mod tree;

pub use tokenize::tokenize;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tree::ShardTree;

const WILDCARD: &str = "<*>";

/// A single mined template: its token sequence (with `<*>` wildcards),
/// how many inputs it has absorbed, and one verbatim example.
#[derive(Debug, Clone)]
pub struct Template {
    pub tokens: Vec<String>,
    pub size: u64,
    pub example: String,
}

impl Template {
    pub fn rendered(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Tuning knobs, pulled from `Config` at construction time.
#[derive(Debug, Clone, Copy)]
pub struct MinerParams {
    pub max_depth: usize,
    pub max_children: usize,
    pub sim_threshold: f64,
    pub max_clusters_per_shard: usize,
}

impl Default for MinerParams {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_children: 100,
            sim_threshold: 0.7,
            max_clusters_per_shard: 1000,
        }
    }
}

/// N independently-locked shards, each owning its own tree and cluster
/// list. A body is routed to a shard by hashing `(first_token, token_count)`
/// so that cross-shard reads are never needed (design §5).
pub struct TemplateMiner {
    shards: Vec<Mutex<ShardTree>>,
}

impl TemplateMiner {
    pub fn new(num_shards: usize, params: MinerParams) -> Self {
        let shards = (0..num_shards.max(1))
            .map(|_| Mutex::new(ShardTree::new(params)))
            .collect();
        Self { shards }
    }

    fn shard_for(&self, tokens: &[String]) -> &Mutex<ShardTree> {
        let first = tokens.first().map(String::as_str).unwrap_or("");
        let key = format!("{first}\u{0}{}", tokens.len());
        let hash = fnv1a(key.as_bytes());
        &self.shards[(hash as usize) % self.shards.len()]
    }

    /// Training mode: mask, tokenize, match-or-create a cluster, and
    /// return the resulting template's rendered form.
    pub fn train(&self, raw_text: &str, masked_text: &str) -> String {
        let tokens = tokenize(masked_text);
        if tokens.is_empty() {
            return String::new();
        }
        let shard = self.shard_for(&tokens);
        let mut tree = shard.lock().expect("template miner shard lock poisoned");
        tree.match_or_insert(tokens, raw_text)
    }

    /// Inference mode: navigate without creating nodes or clusters. Returns
    /// `None` ("no match") for anything the tree hasn't already trained on.
    pub fn infer(&self, masked_text: &str) -> Option<String> {
        let tokens = tokenize(masked_text);
        if tokens.is_empty() {
            return None;
        }
        let shard = self.shard_for(&tokens);
        let tree = shard.lock().expect("template miner shard lock poisoned");
        tree.lookup(&tokens)
    }

    /// All clusters across all shards, sorted by size descending, with
    /// `percentage = size / total_messages * 100`.
    pub fn templates(&self) -> Vec<Template> {
        let mut all: Vec<Template> = self
            .shards
            .iter()
            .flat_map(|s| s.lock().expect("template miner shard lock poisoned").clusters())
            .collect();
        all.sort_by(|a, b| b.size.cmp(&a.size));
        all
    }

    pub fn total_messages(&self) -> u64 {
        self.shards
            .iter()
            .map(|s| s.lock().expect("template miner shard lock poisoned").total_messages())
            .sum()
    }
}

/// Routes log bodies to a `TemplateMiner` scoped to one severity, so
/// clusters never merge across severities: design §3's "bodyTemplates …
/// per severity, aggregated across services" means the miner itself must
/// be per-severity, not just the entry `refresh_body_templates` writes
/// into. Per-severity miners are created lazily on first use, the same
/// read-fast-path / write-fallback shape as `Store`'s entry maps.
pub struct SeverityMiners {
    shards: usize,
    params: MinerParams,
    miners: RwLock<HashMap<String, Arc<TemplateMiner>>>,
}

impl SeverityMiners {
    pub fn new(shards: usize, params: MinerParams) -> Self {
        Self {
            shards,
            params,
            miners: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, severity: &str) -> Arc<TemplateMiner> {
        if let Some(miner) = self.miners.read().expect("severity miner map lock poisoned").get(severity) {
            return Arc::clone(miner);
        }
        let mut miners = self.miners.write().expect("severity miner map lock poisoned");
        Arc::clone(
            miners
                .entry(severity.to_string())
                .or_insert_with(|| Arc::new(TemplateMiner::new(self.shards, self.params))),
        )
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// `sim(a, b) = matched / len(a)`; 0 if lengths differ.
pub(crate) fn similarity(a: &[String], b: &[String]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let matched = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| *x == *y || x.as_str() == WILDCARD || y.as_str() == WILDCARD)
        .count();
    matched as f64 / a.len() as f64
}

/// Generalize two equal-length token sequences: keep identical positions,
/// wildcard the rest.
pub(crate) fn generalize(template: &[String], incoming: &[String]) -> Vec<String> {
    template
        .iter()
        .zip(incoming.iter())
        .map(|(t, i)| if t == i { t.clone() } else { WILDCARD.to_string() })
        .collect()
}
