// src/ingest/providers/jsearch.rs
//! JSearch via RapidAPI. Optional; skipped without `RAPIDAPI_KEY`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::sources::SourceConfig;
use crate::ingest::error::SourceError;
use crate::ingest::http::{build_client, fetch_text};
use crate::ingest::normalize::{first_date, from_unix, id_string, pick, RawJob};
use crate::ingest::providers::{collect_entries, take_array};
use crate::ingest::types::{SourceBatch, SourceProvider};

const NAME: &str = "JSearch";
const DEFAULT_HOST: &str = "jsearch.p.rapidapi.com";
const QUERY: &str = "software developer OR data scientist OR machine learning engineer";

#[derive(Debug, Deserialize)]
struct Item {
    job_id: Option<Value>,
    job_title: Option<String>,
    employer_name: Option<String>,
    job_city: Option<String>,
    job_state: Option<String>,
    job_country: Option<String>,
    job_apply_link: Option<String>,
    job_url: Option<String>,
    job_posted_at_datetime_utc: Option<String>,
    job_posted_at: Option<String>,
    job_posted_at_timestamp: Option<Value>,
    job_description: Option<String>,
}

fn map_item(it: Item) -> RawJob {
    let parts: Vec<&str> = [&it.job_city, &it.job_state, &it.job_country]
        .into_iter()
        .filter_map(|p| p.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .collect();
    let location = (!parts.is_empty()).then(|| parts.join(", "));

    let published = first_date([
        it.job_posted_at_datetime_utc.as_deref(),
        it.job_posted_at.as_deref(),
    ])
    .or_else(|| {
        it.job_posted_at_timestamp
            .as_ref()
            .and_then(Value::as_i64)
            .and_then(from_unix)
    });

    RawJob {
        native_id: id_string(it.job_id.as_ref()),
        title: it.job_title,
        company: it.employer_name,
        location,
        url: pick([it.job_apply_link.as_deref(), it.job_url.as_deref()]),
        published,
        description: it.job_description,
    }
}

pub struct JSearchSource {
    config: SourceConfig,
    client: Client,
}

impl JSearchSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn parse_payload(body: &str, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let payload: Value = serde_json::from_str(body)?;
        let items = take_array(payload, &["data"])?;
        Ok(collect_entries(NAME, items, fetched_at, map_item))
    }
}

#[async_trait]
impl SourceProvider for JSearchSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let key = self.config.require("RAPIDAPI_KEY")?;
        let host = self
            .config
            .credential("JSEARCH_RAPIDAPI_HOST")
            .unwrap_or(DEFAULT_HOST);

        let req = self
            .client
            .get(&self.config.base_url)
            .header("X-RapidAPI-Key", key)
            .header("X-RapidAPI-Host", host)
            .query(&[
                ("query", QUERY),
                ("page", "1"),
                ("num_pages", "1"),
                ("date_posted", "month"),
            ]);
        let body = fetch_text(req, self.config.timeout).await?;
        Self::parse_payload(&body, fetched_at)
    }
}
