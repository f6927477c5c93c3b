// src/ingest/providers/mod.rs
pub mod adzuna;
pub mod careerjet;
pub mod jsearch;
pub mod remotive;
pub mod themuse;
pub mod usajobs;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::sources::{SourceConfig, SourceId};
use crate::ingest::error::{EntryError, SourceError};
use crate::ingest::normalize::{BatchCollector, RawJob};
use crate::ingest::types::{SourceBatch, SourceProvider};

/// Tech-leaning query shared by the keyword-search providers.
pub(crate) const SEARCH_KEYWORDS: &str =
    "software engineer OR developer OR data scientist OR machine learning";
pub(crate) const PAGE_SIZE: &str = "50";

pub fn build(id: SourceId, config: SourceConfig) -> Result<Arc<dyn SourceProvider>> {
    let provider: Arc<dyn SourceProvider> = match id {
        SourceId::Remotive => Arc::new(remotive::RemotiveSource::new(config)?),
        SourceId::Adzuna => Arc::new(adzuna::AdzunaSource::new(config)?),
        SourceId::JSearch => Arc::new(jsearch::JSearchSource::new(config)?),
        SourceId::Careerjet => Arc::new(careerjet::CareerjetSource::new(config)?),
        SourceId::TheMuse => Arc::new(themuse::TheMuseSource::new(config)?),
        SourceId::UsaJobs => Arc::new(usajobs::UsaJobsSource::new(config)?),
    };
    Ok(provider)
}

/// Build every adapter. One that cannot be constructed is logged and left out.
pub fn build_all(configs: Vec<(SourceId, SourceConfig)>) -> Vec<Arc<dyn SourceProvider>> {
    let mut out = Vec::with_capacity(configs.len());
    for (id, config) in configs {
        match build(id, config) {
            Ok(p) => out.push(p),
            Err(e) => tracing::warn!(target: "ingest", source = id.name(), error = ?e, "adapter not built"),
        }
    }
    out
}

/// Walk `path` through nested objects and return the array found there.
/// Missing or null means "no entries"; any other shape is a payload error.
pub(crate) fn take_array(mut payload: Value, path: &[&str]) -> Result<Vec<Value>, SourceError> {
    for key in path {
        payload = match payload {
            Value::Object(mut m) => m.remove(*key).unwrap_or(Value::Null),
            Value::Null => Value::Null,
            _ => {
                return Err(SourceError::Payload(format!(
                    "expected object around '{key}'"
                )))
            }
        };
    }
    match payload {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        _ => Err(SourceError::Payload(format!(
            "'{}' is not an array",
            path.join(".")
        ))),
    }
}

/// Decode entries one by one so a single bad entry only costs itself.
pub(crate) fn collect_entries<T, F>(
    source: &'static str,
    items: Vec<Value>,
    fetched_at: DateTime<Utc>,
    map: F,
) -> SourceBatch
where
    T: DeserializeOwned,
    F: Fn(T) -> RawJob,
{
    let mut c = BatchCollector::new(source, fetched_at);
    for item in items {
        match serde_json::from_value::<T>(item) {
            Ok(entry) => c.push(map(entry)),
            Err(e) => c.reject(EntryError::Undecodable(e.to_string())),
        }
    }
    let batch = c.finish();
    counter!("ingest_events_total", "source" => source).increment(batch.jobs.len() as u64);
    counter!("ingest_malformed_total", "source" => source).increment(batch.dropped as u64);
    batch
}

/// A string, or the first string of an array; providers are inconsistent here.
pub(crate) fn str_or_first(v: Option<&Value>) -> Option<&str> {
    match v? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(|x| x.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn take_array_handles_missing_null_and_wrong_shapes() {
        let v = json!({"a": {"b": [1, 2]}});
        assert_eq!(take_array(v, &["a", "b"]).unwrap().len(), 2);
        assert!(take_array(json!({}), &["jobs"]).unwrap().is_empty());
        assert!(take_array(json!({"jobs": null}), &["jobs"]).unwrap().is_empty());
        assert!(take_array(json!({"jobs": "nope"}), &["jobs"]).is_err());
        assert!(take_array(json!([1]), &["jobs"]).is_err());
    }

    #[test]
    fn str_or_first_accepts_both_shapes() {
        let s = json!("x");
        let a = json!([1, "y", "z"]);
        assert_eq!(str_or_first(Some(&s)), Some("x"));
        assert_eq!(str_or_first(Some(&a)), Some("y"));
        assert_eq!(str_or_first(Some(&json!(3))), None);
        assert_eq!(str_or_first(None), None);
    }

    #[test]
    fn build_all_constructs_every_source() {
        let settings = crate::config::AggregatorSettings::default();
        let configs = crate::config::sources::resolve_all(&settings, |_| None);
        let built = build_all(configs);
        let names: Vec<_> = built.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["Remotive", "Adzuna", "JSearch", "Careerjet", "TheMuse", "USAJobs"]
        );
    }
}
