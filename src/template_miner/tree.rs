//! A single shard's fixed-depth clustering tree.
//!
//! Level 1 buckets by token count (lengths beyond `LEN_MANY_CUTOFF` share
//! one bucket). Level 2 branches by first token, capped at
//! `MinerParams::max_children`; tokens beyond the cap fall through to a
//! shared wildcard branch. The design's remaining levels ("a single
//! wildcard chain down to the leaf") add no branching information beyond
//! that point, so they're collapsed here into the leaf's cluster list
//! directly — `max_depth` still documents the conceptual depth but doesn't
//! need its own data structure once branching stops.

use std::collections::HashMap;

use super::{generalize, similarity, MinerParams, Template};

const LEN_MANY_CUTOFF: usize = 9;
const LEN_MANY_KEY: usize = usize::MAX;
const WILDCARD_BRANCH: &str = "\u{1}<*>\u{1}";

struct Cluster {
    tokens: Vec<String>,
    size: u64,
    last_used: u64,
    example: String,
}

#[derive(Default)]
struct FirstTokenNode {
    clusters: Vec<Cluster>,
}

#[derive(Default)]
struct LengthBucket {
    children: HashMap<String, FirstTokenNode>,
}

pub struct ShardTree {
    buckets: HashMap<usize, LengthBucket>,
    tick: u64,
    total_messages: u64,
    cluster_count: usize,
    params: MinerParams,
}

fn length_key(len: usize) -> usize {
    if len > LEN_MANY_CUTOFF {
        LEN_MANY_KEY
    } else {
        len
    }
}

impl ShardTree {
    pub fn new(params: MinerParams) -> Self {
        Self {
            buckets: HashMap::new(),
            tick: 0,
            total_messages: 0,
            cluster_count: 0,
            params,
        }
    }

    pub fn total_messages(&self) -> u64 {
        self.total_messages
    }

    /// Training-mode navigate + match-or-create, per the design's
    /// match/add algorithm.
    pub fn match_or_insert(&mut self, tokens: Vec<String>, raw_example: &str) -> String {
        self.total_messages += 1;
        self.tick += 1;
        let tick = self.tick;
        let params = self.params;

        let len = tokens.len();
        let first_token = tokens.first().cloned().unwrap_or_default();

        let bucket = self.buckets.entry(length_key(len)).or_default();
        let key = if bucket.children.contains_key(&first_token) || bucket.children.len() < params.max_children {
            first_token
        } else {
            WILDCARD_BRANCH.to_string()
        };
        let node = bucket.children.entry(key).or_default();

        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in node.clusters.iter().enumerate() {
            if cluster.tokens.len() != len {
                continue;
            }
            let sim = similarity(&cluster.tokens, &tokens);
            if sim >= params.sim_threshold && best.map(|(_, b)| sim > b).unwrap_or(true) {
                best = Some((idx, sim));
            }
        }

        if let Some((idx, _)) = best {
            let cluster = &mut node.clusters[idx];
            cluster.size += 1;
            cluster.last_used = tick;
            cluster.tokens = generalize(&cluster.tokens, &tokens);
            return cluster.tokens.join(" ");
        }

        let rendered = tokens.join(" ");
        node.clusters.push(Cluster {
            tokens,
            size: 1,
            last_used: tick,
            example: raw_example.to_string(),
        });
        self.cluster_count += 1;
        self.evict_if_over_capacity(params.max_clusters_per_shard);
        rendered
    }

    /// Inference-mode lookup: same navigation, no mutation, "no match"
    /// returns `None` instead of creating anything.
    pub fn lookup(&self, tokens: &[String]) -> Option<String> {
        let len = tokens.len();
        let first_token = tokens.first().map(String::as_str).unwrap_or("");

        let bucket = self.buckets.get(&length_key(len))?;
        let node = bucket
            .children
            .get(first_token)
            .or_else(|| bucket.children.get(WILDCARD_BRANCH))?;

        node.clusters
            .iter()
            .filter(|c| c.tokens.len() == len)
            .map(|c| (c, similarity(&c.tokens, tokens)))
            .filter(|(_, sim)| *sim >= self.params.sim_threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .map(|(c, _)| c.tokens.join(" "))
    }

    pub fn clusters(&self) -> Vec<Template> {
        self.buckets
            .values()
            .flat_map(|b| b.children.values())
            .flat_map(|n| n.clusters.iter())
            .map(|c| Template {
                tokens: c.tokens.clone(),
                size: c.size,
                example: c.example.clone(),
            })
            .collect()
    }

    fn evict_if_over_capacity(&mut self, max_clusters: usize) {
        if self.cluster_count <= max_clusters {
            return;
        }
        let mut victim: Option<(usize, String, usize, u64)> = None;
        for (&len_key, bucket) in self.buckets.iter() {
            for (child_key, node) in bucket.children.iter() {
                for (cidx, cluster) in node.clusters.iter().enumerate() {
                    if victim.as_ref().map(|(_, _, _, t)| cluster.last_used < *t).unwrap_or(true) {
                        victim = Some((len_key, child_key.clone(), cidx, cluster.last_used));
                    }
                }
            }
        }
        if let Some((len_key, child_key, cidx, _)) = victim {
            if let Some(node) = self.buckets.get_mut(&len_key).and_then(|b| b.children.get_mut(&child_key)) {
                if cidx < node.clusters.len() {
                    node.clusters.remove(cidx);
                    self.cluster_count -= 1;
                }
            }
        }
    }
}
