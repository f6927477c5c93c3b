// src/ingest/providers/remotive.rs
//! Remotive public API. No key needed; returns every listed remote job at once.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::sources::SourceConfig;
use crate::ingest::error::SourceError;
use crate::ingest::http::{build_client, fetch_text};
use crate::ingest::normalize::{first_date, id_string, pick, RawJob};
use crate::ingest::providers::{collect_entries, take_array};
use crate::ingest::types::{SourceBatch, SourceProvider};

const NAME: &str = "Remotive";

#[derive(Debug, Deserialize)]
struct Item {
    id: Option<Value>,
    title: Option<String>,
    company_name: Option<String>,
    company: Option<String>,
    candidate_required_location: Option<String>,
    location: Option<String>,
    url: Option<String>,
    job_url: Option<String>,
    publication_date: Option<String>,
    published_at: Option<String>,
    description: Option<String>,
}

fn map_item(it: Item) -> RawJob {
    RawJob {
        native_id: id_string(it.id.as_ref()),
        title: it.title,
        company: pick([it.company_name.as_deref(), it.company.as_deref()]),
        location: pick([
            it.candidate_required_location.as_deref(),
            it.location.as_deref(),
        ]),
        url: pick([it.url.as_deref(), it.job_url.as_deref()]),
        published: first_date([it.publication_date.as_deref(), it.published_at.as_deref()]),
        description: it.description,
    }
}

pub struct RemotiveSource {
    config: SourceConfig,
    client: Client,
}

impl RemotiveSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    /// Accepts `{"jobs": [...]}` or a bare array.
    pub fn parse_payload(body: &str, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let payload: Value = serde_json::from_str(body)?;
        let items = match payload {
            Value::Array(items) => items,
            other => take_array(other, &["jobs"])?,
        };
        Ok(collect_entries(NAME, items, fetched_at, map_item))
    }
}

#[async_trait]
impl SourceProvider for RemotiveSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let req = self.client.get(&self.config.base_url);
        let body = fetch_text(req, self.config.timeout).await?;
        Self::parse_payload(&body, fetched_at)
    }
}
