//! Ordered regex substitutions that collapse volatile substrings (IDs,
//! timestamps, IPs, ...) into stable placeholders before log bodies reach
//! the template miner, and before span names reach the span-pattern table.

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// One compiled rule: everything matching `regex` becomes `placeholder`.
struct Rule {
    regex: Regex,
    placeholder: &'static str,
}

/// A rule definition as loaded from the optional YAML config file. The
/// placeholder is leaked into a `&'static str` once at load time so that
/// `Rule` doesn't need an owned `String` on every masking call; this is a
/// startup-only operation against a handful of rules, not a hot path.
#[derive(Debug, Deserialize)]
struct RuleDef {
    pattern: String,
    placeholder: String,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<RuleDef>,
}

pub struct PatternMasker {
    rules: Vec<Rule>,
}

impl PatternMasker {
    /// The built-in rule list, applied in this fixed order so that, e.g., a
    /// UUID never gets chewed up by the more general `<HEX>` rule first.
    pub fn default_rules() -> Vec<(&'static str, &'static str)> {
        vec![
            (r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:?\d{2})?", "<TIMESTAMP>"),
            (r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}", "<UUID>"),
            (r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}", "<EMAIL>"),
            (r"(https?://[^\s]+)|(/[a-zA-Z0-9_.\-/]*\d[a-zA-Z0-9_.\-/]*)", "<URL>"),
            (r"\b\d+(\.\d+)?(ms|s|m|h)\b", "<DURATION>"),
            (r"\b\d+(\.\d+)?(B|KB|MB|GB|TB)\b", "<SIZE>"),
            (
                r"\b(\d{1,3}\.){3}\d{1,3}\b|\[[0-9a-fA-F:]+\]",
                "<IP>",
            ),
            (r"\b[0-9a-fA-F]{8,}\b", "<HEX>"),
            (r"-?\d+(\.\d+)?", "<NUM>"),
        ]
    }

    pub fn new() -> Self {
        Self::from_rules(Self::default_rules())
    }

    fn from_rules(defs: Vec<(&'static str, &'static str)>) -> Self {
        let rules = defs
            .into_iter()
            .map(|(pattern, placeholder)| Rule {
                regex: Regex::new(pattern).expect("built-in pattern must compile"),
                placeholder,
            })
            .collect();
        Self { rules }
    }

    /// Load rules from a YAML file; a missing file is not an error (the
    /// caller should fall back to `PatternMasker::new()`), but a present,
    /// malformed file aborts startup per the design's error-handling notes.
    pub fn from_config_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading pattern config {}", path.display()))?;
        let file: RuleFile = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing pattern config {}", path.display()))?;

        let mut rules = Vec::with_capacity(file.rules.len());
        for def in file.rules {
            let regex = Regex::new(&def.pattern)
                .with_context(|| format!("compiling pattern `{}`", def.pattern))?;
            let placeholder: &'static str = Box::leak(def.placeholder.into_boxed_str());
            rules.push(Rule { regex, placeholder });
        }
        Ok(Self { rules })
    }

    /// Apply every rule in order to `input`, first match wins per position
    /// (later rules only see what earlier rules left unmasked).
    pub fn mask(&self, input: &str) -> String {
        let mut out = input.to_string();
        for rule in &self.rules {
            out = rule.regex.replace_all(&out, rule.placeholder).into_owned();
        }
        out
    }
}

impl Default for PatternMasker {
    fn default() -> Self {
        Self::new()
    }
}
