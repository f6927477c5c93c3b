// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::{AggregatorSettings, SourceConfig, SourceId};
pub use crate::ingest::types::{
    AggregationResult, CanonicalJob, Category, SourceOutcome, SourceProvider, SourceReport,
};
pub use crate::ingest::Aggregator;

use anyhow::Context;
use tracing::info;

/// Load `.env`, settings and source credentials, and build the aggregator.
/// Shared by the server entrypoint and the `fetch_once` binary.
pub fn bootstrap() -> anyhow::Result<(AggregatorSettings, Aggregator)> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    let settings = AggregatorSettings::load_default().context("loading aggregator settings")?;
    let aggregator = Aggregator::from_env(&settings);
    info!(
        sources = ?aggregator.source_names(),
        max_results = settings.max_results,
        source_timeout_secs = settings.source_timeout_secs,
        "aggregator ready"
    );
    Ok((settings, aggregator))
}
