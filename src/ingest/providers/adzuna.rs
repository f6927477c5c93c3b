// src/ingest/providers/adzuna.rs
//! Adzuna search API. Needs an app id/key pair; country defaults to "us".

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::sources::SourceConfig;
use crate::ingest::error::SourceError;
use crate::ingest::http::{build_client, fetch_text};
use crate::ingest::normalize::{id_string, parse_published, pick, RawJob};
use crate::ingest::providers::{collect_entries, take_array, PAGE_SIZE};
use crate::ingest::types::{SourceBatch, SourceProvider};

const NAME: &str = "Adzuna";
const DEFAULT_COUNTRY: &str = "us";
// Adzuna has no boolean OR; `what_or` matches any of the words.
const WHAT_OR: &str = "software developer engineer scientist data machine learning";

#[derive(Debug, Deserialize)]
struct Named {
    display_name: Option<String>,
    name: Option<String>,
    area: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: Option<Value>,
    title: Option<String>,
    company: Option<Named>,
    location: Option<Named>,
    redirect_url: Option<String>,
    url: Option<String>,
    created: Option<String>,
    description: Option<String>,
}

fn map_item(it: Item) -> RawJob {
    let company = it
        .company
        .as_ref()
        .and_then(|c| pick([c.display_name.as_deref(), c.name.as_deref()]));
    let location = it.location.as_ref().and_then(|l| {
        pick([
            l.display_name.as_deref(),
            l.area.as_deref().and_then(|v| v.first()).map(String::as_str),
        ])
    });
    RawJob {
        native_id: id_string(it.id.as_ref()),
        title: it.title,
        company,
        location,
        url: pick([it.redirect_url.as_deref(), it.url.as_deref()]),
        published: it.created.as_deref().and_then(parse_published),
        description: it.description,
    }
}

pub struct AdzunaSource {
    config: SourceConfig,
    client: Client,
}

impl AdzunaSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn parse_payload(body: &str, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let payload: Value = serde_json::from_str(body)?;
        let items = take_array(payload, &["results"])?;
        Ok(collect_entries(NAME, items, fetched_at, map_item))
    }

    fn search_url(&self) -> String {
        let country = self
            .config
            .credential("ADZUNA_COUNTRY")
            .unwrap_or(DEFAULT_COUNTRY)
            .to_ascii_lowercase();
        format!(
            "{}/{}/search/1",
            self.config.base_url.trim_end_matches('/'),
            country
        )
    }
}

#[async_trait]
impl SourceProvider for AdzunaSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let app_id = self.config.require("ADZUNA_APP_ID")?;
        let app_key = self.config.require("ADZUNA_APP_KEY")?;

        let req = self.client.get(self.search_url()).query(&[
            ("app_id", app_id),
            ("app_key", app_key),
            ("results_per_page", PAGE_SIZE),
            ("what_or", WHAT_OR),
            ("content-type", "application/json"),
        ]);
        let body = fetch_text(req, self.config.timeout).await?;
        Self::parse_payload(&body, fetched_at)
    }
}
