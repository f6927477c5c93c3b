// src/ingest/mod.rs
pub mod categorize;
pub mod dedup;
pub mod error;
pub mod http;
pub mod normalize;
pub mod providers;
pub mod rank;
pub mod types;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;

use crate::config::settings::AggregatorSettings;
use crate::config::sources::{resolve_all, resolve_from_env};
use crate::ingest::error::SourceError;
use crate::ingest::types::{
    AggregationResult, CanonicalJob, SourceOutcome, SourceProvider, SourceReport,
};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_source_outcomes_total",
            "Per-source outcomes (succeeded/skipped/failed)."
        );
        describe_counter!("ingest_events_total", "Canonical records produced by adapters.");
        describe_counter!(
            "ingest_malformed_total",
            "Upstream entries dropped during normalization."
        );
        describe_counter!("ingest_dedup_total", "Records removed as duplicates.");
        describe_counter!(
            "ingest_truncated_total",
            "Records cut by the result size cap."
        );
        describe_histogram!("ingest_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the aggregation pipeline last ran."
        );
    });
}

/// Counts from the post-fetch stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub raw: usize,
    pub dedup: usize,
    pub truncated: usize,
}

/// Pure stages after the fan-in: dedup → categorize → rank/limit.
/// `raw` must already be in a stable order (source name, then adapter order).
pub fn process_batch(raw: Vec<CanonicalJob>, max_results: usize) -> (Vec<CanonicalJob>, StageCounts) {
    let raw_len = raw.len();
    let (mut unique, dedup) = dedup::dedup(raw);
    categorize::categorize_all(&mut unique);
    let (jobs, truncated) = rank::rank_and_limit(unique, max_results);
    (
        jobs,
        StageCounts {
            raw: raw_len,
            dedup,
            truncated,
        },
    )
}

async fn fetch_one(
    provider: &dyn SourceProvider,
    fetched_at: DateTime<Utc>,
) -> (SourceReport, Vec<CanonicalJob>) {
    let name = provider.name();
    let cfg = provider.config();
    let t0 = Instant::now();

    let (outcome, jobs) = if !cfg.enabled {
        let reason = cfg
            .disabled_reason
            .clone()
            .unwrap_or_else(|| "disabled".to_string());
        (SourceOutcome::Skipped { reason }, Vec::new())
    } else {
        let call = AssertUnwindSafe(provider.fetch_latest(fetched_at)).catch_unwind();
        match tokio::time::timeout(cfg.timeout, call).await {
            Ok(Ok(Ok(batch))) => (
                SourceOutcome::Succeeded {
                    count: batch.jobs.len(),
                    dropped: batch.dropped,
                },
                batch.jobs,
            ),
            Ok(Ok(Err(e))) if e.is_skip() => {
                (SourceOutcome::Skipped { reason: e.to_string() }, Vec::new())
            }
            Ok(Ok(Err(e))) => (SourceOutcome::Failed { reason: e.to_string() }, Vec::new()),
            Ok(Err(_panic)) => (
                SourceOutcome::Failed {
                    reason: "adapter panicked".to_string(),
                },
                Vec::new(),
            ),
            Err(_elapsed) => (
                SourceOutcome::Failed {
                    reason: SourceError::Timeout(cfg.timeout).to_string(),
                },
                Vec::new(),
            ),
        }
    };

    let elapsed_ms = t0.elapsed().as_millis() as u64;
    match &outcome {
        SourceOutcome::Succeeded { count, dropped } => tracing::info!(
            target: "ingest",
            source = name, count = *count, dropped = *dropped, elapsed_ms,
            "source succeeded"
        ),
        SourceOutcome::Skipped { reason } => tracing::info!(
            target: "ingest",
            source = name, reason = %reason,
            "source skipped"
        ),
        SourceOutcome::Failed { reason } => tracing::warn!(
            target: "ingest",
            source = name, reason = %reason, elapsed_ms,
            "source failed"
        ),
    }
    counter!("ingest_source_outcomes_total", "source" => name, "outcome" => outcome.kind())
        .increment(1);
    histogram!("ingest_fetch_ms", "source" => name).record(elapsed_ms as f64);

    (
        SourceReport {
            source: name.to_string(),
            outcome,
            elapsed_ms,
        },
        jobs,
    )
}

fn aborted(name: &'static str) -> (SourceReport, Vec<CanonicalJob>) {
    counter!("ingest_source_outcomes_total", "source" => name, "outcome" => "failed").increment(1);
    (
        SourceReport {
            source: name.to_string(),
            outcome: SourceOutcome::Failed {
                reason: "source task aborted".to_string(),
            },
            elapsed_ms: 0,
        },
        Vec::new(),
    )
}

/// Run one aggregation: fan out to every provider on its own task, wait for all
/// of them (each bounded by its own timeout), then dedup, categorize, rank and cap.
///
/// Never fails. Dropping the returned future aborts in-flight adapter tasks.
pub async fn run_once(
    providers: &[Arc<dyn SourceProvider>],
    max_results: usize,
) -> AggregationResult {
    ensure_metrics_described();

    let fetched_at = Utc::now();
    let mut tasks = JoinSet::new();
    for (idx, provider) in providers.iter().enumerate() {
        let provider = Arc::clone(provider);
        tasks.spawn(async move { (idx, fetch_one(provider.as_ref(), fetched_at).await) });
    }

    // One slot per provider, filled in registration order whatever the completion order.
    let mut filled: Vec<Option<(SourceReport, Vec<CanonicalJob>)>> =
        providers.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, slot)) => filled[idx] = Some(slot),
            Err(e) => tracing::error!(target: "ingest", error = %e, "source task aborted"),
        }
    }
    let mut slots: Vec<(SourceReport, Vec<CanonicalJob>)> = filled
        .into_iter()
        .zip(providers)
        .map(|(slot, provider)| slot.unwrap_or_else(|| aborted(provider.name())))
        .collect();

    // Completion order never matters: dedup ties follow source name, then adapter order.
    slots.sort_by(|a, b| a.0.source.cmp(&b.0.source));

    let mut outcomes = Vec::with_capacity(slots.len());
    let mut raw = Vec::new();
    for (report, mut jobs) in slots {
        raw.append(&mut jobs);
        outcomes.push(report);
    }

    let (jobs, counts) = process_batch(raw, max_results);

    counter!("ingest_dedup_total").increment(counts.dedup as u64);
    counter!("ingest_truncated_total").increment(counts.truncated as u64);
    gauge!("ingest_pipeline_last_run_ts").set(fetched_at.timestamp().max(0) as f64);

    tracing::info!(
        target: "ingest",
        raw = counts.raw,
        dedup = counts.dedup,
        truncated = counts.truncated,
        kept = jobs.len(),
        "aggregation finished"
    );

    AggregationResult { jobs, outcomes }
}

/// Registered adapters plus the result cap. Built once at startup.
pub struct Aggregator {
    providers: Vec<Arc<dyn SourceProvider>>,
    max_results: usize,
}

impl Aggregator {
    pub fn new(mut providers: Vec<Arc<dyn SourceProvider>>, max_results: usize) -> Self {
        providers.sort_by(|a, b| a.name().cmp(b.name()));
        Self {
            providers,
            max_results,
        }
    }

    /// Build all known adapters from settings and a credential lookup.
    pub fn from_settings<F>(settings: &AggregatorSettings, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let configs = resolve_all(settings, lookup);
        Self::new(providers::build_all(configs), settings.max_results)
    }

    pub fn from_env(settings: &AggregatorSettings) -> Self {
        let configs = resolve_from_env(settings);
        Self::new(providers::build_all(configs), settings.max_results)
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn run_once(&self) -> AggregationResult {
        run_once(&self.providers, self.max_results).await
    }
}
