// src/ingest/rank.rs
use std::cmp::Ordering;

use crate::ingest::types::CanonicalJob;

/// Newest first; ties broken by source name, then id.
pub fn compare(a: &CanonicalJob, b: &CanonicalJob) -> Ordering {
    b.published
        .cmp(&a.published)
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort and cap. Returns (kept, truncated_count); truncation is expected, not an error.
pub fn rank_and_limit(mut jobs: Vec<CanonicalJob>, max: usize) -> (Vec<CanonicalJob>, usize) {
    jobs.sort_by(compare);
    let truncated = jobs.len().saturating_sub(max);
    jobs.truncate(max);
    (jobs, truncated)
}
