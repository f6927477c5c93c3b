// src/ingest/error.rs
use std::time::Duration;

use thiserror::Error;

/// Source-level failure. Never crosses the pipeline boundary; the orchestrator
/// turns it into a `SourceOutcome`.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Source switched off or missing a required credential.
    #[error("disabled: {0}")]
    Disabled(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Connect/DNS/TLS/body-read failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// Body was not the JSON envelope the adapter expects.
    #[error("malformed payload: {0}")]
    Payload(String),
}

impl SourceError {
    pub fn is_skip(&self) -> bool {
        matches!(self, SourceError::Disabled(_))
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Payload(e.to_string())
    }
}

/// Why a single upstream entry was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("missing apply url")]
    MissingUrl,

    #[error("invalid apply url '{0}'")]
    InvalidUrl(String),

    #[error("undecodable entry: {0}")]
    Undecodable(String),
}
