// src/ingest/types.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::sources::SourceConfig;
use crate::ingest::error::SourceError;

/// Closed set of buckets a posting can land in. Only the categorizer assigns these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    SoftwareEngineering,
    DataScience,
    AIML,
    Internship,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::SoftwareEngineering,
        Category::DataScience,
        Category::AIML,
        Category::Internship,
        Category::Other,
    ];

    /// Human-facing label, e.g. "AI/ML".
    pub fn label(self) -> &'static str {
        match self {
            Category::SoftwareEngineering => "Software Engineering",
            Category::DataScience => "Data Science",
            Category::AIML => "AI/ML",
            Category::Internship => "Internship",
            Category::Other => "Other",
        }
    }

    /// CSS-friendly slug, e.g. "ai-ml".
    pub fn slug(self) -> &'static str {
        match self {
            Category::SoftwareEngineering => "software-engineering",
            Category::DataScience => "data-science",
            Category::AIML => "ai-ml",
            Category::Internship => "internship",
            Category::Other => "other",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One job posting in the unified schema, independent of where it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalJob {
    pub id: String,       // "{source}:{native_id}"
    pub title: String,    // never empty ("Untitled" placeholder)
    pub company: String,  // never empty ("Unknown" placeholder)
    pub location: String, // may be the literal "Remote"
    pub url: String,      // absolute http(s)
    pub category: Category,
    pub source: String,
    pub published: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What one adapter produced for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBatch {
    pub jobs: Vec<CanonicalJob>,
    /// Upstream entries that could not be mapped and were skipped.
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Succeeded { count: usize, dropped: usize },
    Skipped { reason: String },
    Failed { reason: String },
}

impl SourceOutcome {
    /// Short label used as a metrics tag.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceOutcome::Succeeded { .. } => "succeeded",
            SourceOutcome::Skipped { .. } => "skipped",
            SourceOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOutcome::Succeeded { count, .. } => write!(f, "succeeded:{count}"),
            SourceOutcome::Skipped { .. } => f.write_str("skipped"),
            SourceOutcome::Failed { reason } => write!(f, "failed:{reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
    pub elapsed_ms: u64,
}

/// Final, capped, ordered output of one pipeline run plus per-source outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationResult {
    pub jobs: Vec<CanonicalJob>,
    pub outcomes: Vec<SourceReport>,
}

/// Uniform adapter capability. Implementations map one provider's payload into
/// canonical records and must never panic or bubble upstream errors other than
/// through `SourceError`.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn config(&self) -> &SourceConfig;

    /// `fetched_at` is the fallback publish time for entries without a date.
    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError>;
}
