// src/ingest/providers/themuse.rs
//! The Muse public jobs API (startup/tech companies).

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::sources::SourceConfig;
use crate::ingest::error::SourceError;
use crate::ingest::http::{build_client, fetch_text};
use crate::ingest::normalize::{id_string, parse_published, RawJob};
use crate::ingest::providers::{collect_entries, take_array};
use crate::ingest::types::{SourceBatch, SourceProvider};

const NAME: &str = "TheMuse";
const CATEGORIES: [&str; 3] = ["Software Engineering", "Data Science", "Engineering"];

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Refs {
    landing_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: Option<Value>,
    name: Option<String>,
    company: Option<Named>,
    // Sent as null for some listings.
    locations: Option<Vec<Named>>,
    refs: Option<Refs>,
    publication_date: Option<String>,
    contents: Option<String>,
}

fn map_item(it: Item) -> RawJob {
    RawJob {
        native_id: id_string(it.id.as_ref()),
        title: it.name,
        company: it.company.and_then(|c| c.name),
        location: it.locations.into_iter().flatten().find_map(|l| l.name),
        url: it.refs.and_then(|r| r.landing_page),
        published: it.publication_date.as_deref().and_then(parse_published),
        description: it.contents,
    }
}

pub struct TheMuseSource {
    config: SourceConfig,
    client: Client,
}

impl TheMuseSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn parse_payload(body: &str, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let payload: Value = serde_json::from_str(body)?;
        let items = take_array(payload, &["results"])?;
        Ok(collect_entries(NAME, items, fetched_at, map_item))
    }
}

#[async_trait]
impl SourceProvider for TheMuseSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let key = self.config.require("THEMUSE_API_KEY")?;

        let mut params = vec![("api_key", key), ("page", "1")];
        params.extend(CATEGORIES.iter().map(|c| ("category", *c)));

        let req = self.client.get(&self.config.base_url).query(&params);
        let body = fetch_text(req, self.config.timeout).await?;
        Self::parse_payload(&body, fetched_at)
    }
}
