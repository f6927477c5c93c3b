// src/ingest/dedup.rs
use std::collections::HashMap;

use crate::ingest::normalize::PLACEHOLDER_LOCATION;
use crate::ingest::types::CanonicalJob;

/// Case-fold, trim, collapse whitespace runs. Punctuation is left alone on purpose
/// ("Sr. Engineer" and "Sr Engineer" stay distinct).
pub fn fold(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn dedup_key(job: &CanonicalJob) -> (String, String) {
    (fold(&job.title), fold(&job.company))
}

fn location_rank(location: &str) -> u8 {
    let l = location.trim();
    if l.is_empty() || l.eq_ignore_ascii_case(PLACEHOLDER_LOCATION) {
        0
    } else {
        1
    }
}

/// Collapse records sharing a normalized (title, company) key.
///
/// Input order is the tie-breaker, so callers must hand in a stable order. A later
/// duplicate replaces the kept record only when its location is strictly more
/// informative. Returns (survivors, removed_count).
pub fn dedup(jobs: Vec<CanonicalJob>) -> (Vec<CanonicalJob>, usize) {
    let mut index: HashMap<(String, String), usize> = HashMap::with_capacity(jobs.len());
    let mut keep: Vec<CanonicalJob> = Vec::with_capacity(jobs.len());
    let mut removed = 0usize;

    for job in jobs {
        let key = dedup_key(&job);
        match index.get(&key).copied() {
            Some(i) => {
                removed += 1;
                if location_rank(&job.location) > location_rank(&keep[i].location) {
                    keep[i] = job;
                }
            }
            None => {
                index.insert(key, keep.len());
                keep.push(job);
            }
        }
    }

    (keep, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Category;
    use chrono::{TimeZone, Utc};

    fn job(source: &str, title: &str, company: &str, location: &str) -> CanonicalJob {
        CanonicalJob {
            id: format!("{source}:{title}"),
            title: title.into(),
            company: company.into(),
            location: location.into(),
            url: "https://example.com/j".into(),
            category: Category::Other,
            source: source.into(),
            published: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            description: None,
        }
    }

    #[test]
    fn case_and_whitespace_only_differences_collapse() {
        let (out, removed) = dedup(vec![
            job("Adzuna", "Backend Engineer", "Acme", "Berlin"),
            job("Remotive", "  backend   ENGINEER ", "ACME ", "Berlin"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(removed, 1);
        assert_eq!(out[0].source, "Adzuna");
    }

    #[test]
    fn different_titles_do_not_collapse() {
        let (out, removed) = dedup(vec![
            job("Adzuna", "Backend Engineer", "Acme", "Remote"),
            job("Remotive", "Senior Backend Engineer", "Acme", "Remote"),
            job("Remotive", "Sr. Engineer", "Acme", "Remote"),
            job("Remotive", "Sr Engineer", "Acme", "Remote"),
        ]);
        assert_eq!(out.len(), 4);
        assert_eq!(removed, 0);
    }

    #[test]
    fn more_informative_location_wins() {
        let (out, _) = dedup(vec![
            job("Adzuna", "Data Analyst", "Acme", "Remote"),
            job("JSearch", "data analyst", "acme", "Austin, TX, US"),
            job("USAJobs", "Data Analyst", "Acme", "Denver, CO"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "JSearch");
        assert_eq!(out[0].location, "Austin, TX, US");
    }

    #[test]
    fn same_company_different_role_survives() {
        let (out, _) = dedup(vec![
            job("A", "Backend Engineer", "Acme", "Remote"),
            job("A", "Backend Engineer", "Globex", "Remote"),
        ]);
        assert_eq!(out.len(), 2);
    }
}
