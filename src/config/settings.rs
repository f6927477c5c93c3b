// src/config/settings.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "AGGREGATOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/aggregator.toml";

pub const ENV_MAX_RESULTS: &str = "AGGREGATOR_MAX_RESULTS";
pub const ENV_SOURCE_TIMEOUT_SECS: &str = "AGGREGATOR_SOURCE_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AGGREGATOR_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_source_timeout_secs() -> u64 {
    DEFAULT_SOURCE_TIMEOUT_SECS
}
fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Process-wide aggregation knobs. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AggregatorSettings {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Per-source wall-clock budget.
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    /// Deadline for one whole aggregation call, enforced by the serving layer.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Keyed by lowercase source key ("adzuna", "usajobs", ...).
    #[serde(default)]
    pub sources: BTreeMap<String, SourceOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceOverride {
    /// `false` switches a source off even when its credentials are present.
    pub enabled: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            sources: BTreeMap::new(),
        }
    }
}

impl AggregatorSettings {
    /// Load settings from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading aggregator settings from {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("parsing aggregator settings at {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let mut cfg: AggregatorSettings = toml::from_str(s)?;
        cfg.fold_source_keys()?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Load settings using env var + fallbacks, then apply env overrides:
    /// 1) $AGGREGATOR_CONFIG_PATH
    /// 2) config/aggregator.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_overrides(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Apply numeric overrides from a key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(v) = num(ENV_MAX_RESULTS) {
            self.max_results = v as usize;
        }
        if let Some(v) = num(ENV_SOURCE_TIMEOUT_SECS) {
            self.source_timeout_secs = v;
        }
        if let Some(v) = num(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = v;
        }
        self.sanitize();
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn source_override(&self, key: &str) -> Option<&SourceOverride> {
        self.sources.get(key)
    }

    fn sanitize(&mut self) {
        if self.max_results == 0 {
            self.max_results = DEFAULT_MAX_RESULTS;
        }
        if self.source_timeout_secs == 0 {
            self.source_timeout_secs = DEFAULT_SOURCE_TIMEOUT_SECS;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
    }

    /// Table keys are matched case-insensitively, so two tables folding to the
    /// same key would shadow each other.
    fn fold_source_keys(&mut self) -> Result<()> {
        let sources = std::mem::take(&mut self.sources);
        for (key, ov) in sources {
            let folded = key.trim().to_ascii_lowercase();
            if self.sources.contains_key(&folded) {
                return Err(anyhow!(
                    "duplicate [sources.{folded}] table (keys are case-insensitive)"
                ));
            }
            self.sources.insert(folded, ov);
        }
        Ok(())
    }
}
