//! # Source configuration
//!
//! Resolves one [`SourceConfig`] per provider from two inputs:
//! the aggregator settings file (per-source overrides) and a key lookup
//! (normally the process environment, populated from `.env` by `dotenvy`).
//!
//! Missing or blank required credentials never fail resolution; they produce a
//! disabled config carrying the reason, which the orchestrator reports as a skip.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::settings::AggregatorSettings;
use crate::ingest::error::SourceError;

/// Closed set of integrated job APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceId {
    Remotive,
    Adzuna,
    JSearch,
    Careerjet,
    TheMuse,
    UsaJobs,
}

impl SourceId {
    pub const ALL: [SourceId; 6] = [
        SourceId::Remotive,
        SourceId::Adzuna,
        SourceId::JSearch,
        SourceId::Careerjet,
        SourceId::TheMuse,
        SourceId::UsaJobs,
    ];

    /// Provider name as it appears in records and logs.
    pub fn name(self) -> &'static str {
        match self {
            SourceId::Remotive => "Remotive",
            SourceId::Adzuna => "Adzuna",
            SourceId::JSearch => "JSearch",
            SourceId::Careerjet => "Careerjet",
            SourceId::TheMuse => "TheMuse",
            SourceId::UsaJobs => "USAJobs",
        }
    }

    /// Lowercase key used for `[sources.<key>]` tables.
    pub fn key(self) -> &'static str {
        match self {
            SourceId::Remotive => "remotive",
            SourceId::Adzuna => "adzuna",
            SourceId::JSearch => "jsearch",
            SourceId::Careerjet => "careerjet",
            SourceId::TheMuse => "themuse",
            SourceId::UsaJobs => "usajobs",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            SourceId::Remotive => "https://remotive.com/api/remote-jobs",
            SourceId::Adzuna => "https://api.adzuna.com/v1/api/jobs",
            SourceId::JSearch => "https://jsearch.p.rapidapi.com/search",
            SourceId::Careerjet => "https://public.api.careerjet.net/search",
            SourceId::TheMuse => "https://www.themuse.com/api/public/jobs",
            SourceId::UsaJobs => "https://data.usajobs.gov/api/Search",
        }
    }

    /// Keys that must be present and non-blank for the source to run.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            SourceId::Remotive | SourceId::UsaJobs => &[],
            SourceId::Adzuna => &["ADZUNA_APP_ID", "ADZUNA_APP_KEY"],
            SourceId::JSearch => &["RAPIDAPI_KEY"],
            SourceId::Careerjet => &["CAREERJET_AFFID"],
            SourceId::TheMuse => &["THEMUSE_API_KEY"],
        }
    }

    pub fn optional_keys(self) -> &'static [&'static str] {
        match self {
            SourceId::Remotive | SourceId::TheMuse => &[],
            SourceId::Adzuna => &["ADZUNA_COUNTRY"],
            SourceId::JSearch => &["JSEARCH_RAPIDAPI_HOST"],
            SourceId::Careerjet => &["CAREERJET_LOCALE", "CAREERJET_LOCATION"],
            SourceId::UsaJobs => &["USAJOBS_EMAIL", "USAJOBS_API_KEY"],
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|id| {
            id.key().eq_ignore_ascii_case(s) || id.name().eq_ignore_ascii_case(s)
        })
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-source runtime configuration. Never mutated by the pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub enabled: bool,
    pub credentials: BTreeMap<String, String>,
    pub base_url: String,
    pub timeout: Duration,
    /// Set when `enabled == false`.
    pub disabled_reason: Option<String>,
}

// Credentials stay out of logs; only key names are printed.
impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("enabled", &self.enabled)
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("disabled_reason", &self.disabled_reason)
            .finish()
    }
}

impl SourceConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            enabled: true,
            credentials: BTreeMap::new(),
            base_url: base_url.into(),
            timeout,
            disabled_reason: None,
        }
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }

    pub fn disable(mut self, reason: impl Into<String>) -> Self {
        self.enabled = false;
        self.disabled_reason = Some(reason.into());
        self
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials
            .get(key)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Like [`credential`](Self::credential) but a missing key means "skip this source".
    pub fn require(&self, key: &str) -> Result<&str, SourceError> {
        self.credential(key)
            .ok_or_else(|| SourceError::Disabled(format!("{key} not set")))
    }

    /// Build the config for `id` from settings overrides and a key lookup.
    pub fn resolve<F>(id: SourceId, settings: &AggregatorSettings, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let ov = settings.source_override(id.key());
        let timeout = ov
            .and_then(|o| o.timeout_secs)
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| settings.source_timeout());
        let base_url = ov
            .and_then(|o| o.base_url.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(id.default_base_url());

        let mut cfg = SourceConfig::new(base_url, timeout);
        let mut missing = Vec::new();
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        for key in id.required_keys() {
            if let Some(v) = read(key) {
                cfg.credentials.insert(key.to_string(), v);
            } else {
                missing.push(*key);
            }
        }
        for key in id.optional_keys() {
            if let Some(v) = read(key) {
                cfg.credentials.insert(key.to_string(), v);
            }
        }

        if ov.and_then(|o| o.enabled) == Some(false) {
            return cfg.disable("disabled in settings");
        }
        if !missing.is_empty() {
            return cfg.disable(format!("missing {}", missing.join(", ")));
        }
        cfg
    }
}

/// Resolve every known source, in `SourceId::ALL` order.
pub fn resolve_all<F>(settings: &AggregatorSettings, lookup: F) -> Vec<(SourceId, SourceConfig)>
where
    F: Fn(&str) -> Option<String>,
{
    SourceId::ALL
        .into_iter()
        .map(|id| (id, SourceConfig::resolve(id, settings, &lookup)))
        .collect()
}

pub fn resolve_from_env(settings: &AggregatorSettings) -> Vec<(SourceId, SourceConfig)> {
    resolve_all(settings, |k| std::env::var(k).ok())
}
