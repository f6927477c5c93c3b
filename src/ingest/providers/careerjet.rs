// src/ingest/providers/careerjet.rs
//! Careerjet public search. Needs an affiliate id; entries carry no native id,
//! so the canonical id is derived from the listing URL.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::sources::SourceConfig;
use crate::ingest::error::SourceError;
use crate::ingest::http::{build_client, fetch_text};
use crate::ingest::normalize::{parse_published, pick, RawJob};
use crate::ingest::providers::{collect_entries, take_array, PAGE_SIZE, SEARCH_KEYWORDS};
use crate::ingest::types::{SourceBatch, SourceProvider};

const NAME: &str = "Careerjet";
const DEFAULT_LOCALE: &str = "en_US";

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    company: Option<String>,
    locations: Option<String>,
    location: Option<String>,
    url: Option<String>,
    site: Option<String>,
    date: Option<String>,
    description: Option<String>,
}

fn map_item(it: Item) -> RawJob {
    RawJob {
        native_id: None,
        title: it.title,
        company: it.company,
        location: pick([it.locations.as_deref(), it.location.as_deref()]),
        url: pick([it.url.as_deref(), it.site.as_deref()]),
        published: it.date.as_deref().and_then(parse_published),
        description: it.description,
    }
}

pub struct CareerjetSource {
    config: SourceConfig,
    client: Client,
}

impl CareerjetSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn parse_payload(body: &str, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let payload: Value = serde_json::from_str(body)?;
        let items = take_array(payload, &["jobs"])?;
        Ok(collect_entries(NAME, items, fetched_at, map_item))
    }
}

#[async_trait]
impl SourceProvider for CareerjetSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let affid = self.config.require("CAREERJET_AFFID")?;
        let locale = self
            .config
            .credential("CAREERJET_LOCALE")
            .unwrap_or(DEFAULT_LOCALE);

        let mut params = vec![
            ("affid", affid),
            ("locale_code", locale),
            ("keywords", SEARCH_KEYWORDS),
            ("pagesize", PAGE_SIZE),
            ("page", "1"),
        ];
        if let Some(location) = self.config.credential("CAREERJET_LOCATION") {
            params.push(("location", location));
        }

        let req = self.client.get(&self.config.base_url).query(&params);
        let body = fetch_text(req, self.config.timeout).await?;
        Self::parse_payload(&body, fetched_at)
    }
}
