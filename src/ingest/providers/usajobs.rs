// src/ingest/providers/usajobs.rs
//! USAJobs search API (US federal positions). Runs without a key; the contact
//! email goes in `User-Agent` and an optional key raises rate limits.

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
use crate::ingest::providers::{collect_entries, str_or_first, take_array, PAGE_SIZE};
use crate::ingest::types::{SourceBatch, SourceProvider};

const NAME: &str = "USAJobs";
const DEFAULT_EMAIL: &str = "user@example.com";
const DEFAULT_EMPLOYER: &str = "US Government";
const KEYWORD: &str = "software engineer OR developer OR data scientist OR information technology";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Item {
    matched_object_id: Option<Value>,
    matched_object_descriptor: Option<Descriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Descriptor {
    #[serde(rename = "PositionID")]
    position_id: Option<Value>,
    position_title: Option<String>,
    organization_name: Option<String>,
    organization_codes: Option<Value>,
    position_location_display: Option<Value>,
    position_location: Option<Vec<LocationEntry>>,
    #[serde(rename = "PositionURI")]
    position_uri: Option<Value>,
    #[serde(rename = "ApplyURI")]
    apply_uri: Option<Value>,
    publication_start_date: Option<String>,
    user_area: Option<UserArea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LocationEntry {
    location_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserArea {
    details: Option<Details>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Details {
    job_summary: Option<String>,
}

fn map_item(it: Item) -> RawJob {
    let Some(d) = it.matched_object_descriptor else {
        // No descriptor means no URL; canonicalize drops it and counts it.
        return RawJob::default();
    };
    let native_id = id_string(it.matched_object_id.as_ref())
        .or_else(|| id_string(d.position_id.as_ref()));
    let company = pick([
        d.organization_name.as_deref(),
        str_or_first(d.organization_codes.as_ref()),
    ])
    .unwrap_or_else(|| DEFAULT_EMPLOYER.to_string());
    let location = pick([
        str_or_first(d.position_location_display.as_ref()),
        d.position_location
            .as_deref()
            .and_then(|v| v.first())
            .and_then(|l| l.location_name.as_deref()),
    ]);
    let url = pick([
        str_or_first(d.position_uri.as_ref()),
        str_or_first(d.apply_uri.as_ref()),
    ]);

    RawJob {
        native_id,
        title: d.position_title,
        company: Some(company),
        location,
        url,
        published: d.publication_start_date.as_deref().and_then(parse_published),
        description: d.user_area.and_then(|u| u.details).and_then(|x| x.job_summary),
    }
}

pub struct UsaJobsSource {
    config: SourceConfig,
    client: Client,
}

impl UsaJobsSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn parse_payload(body: &str, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let payload: Value = serde_json::from_str(body)?;
        let items = take_array(payload, &["SearchResult", "SearchResultItems"])?;
        Ok(collect_entries(NAME, items, fetched_at, map_item))
    }
}

#[async_trait]
impl SourceProvider for UsaJobsSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn fetch_latest(&self, fetched_at: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        let email = self
            .config
            .credential("USAJOBS_EMAIL")
            .unwrap_or(DEFAULT_EMAIL);

        let mut req = self
            .client
            .get(&self.config.base_url)
            .header(reqwest::header::USER_AGENT, email)
            .query(&[
                ("Keyword", KEYWORD),
                ("ResultsPerPage", PAGE_SIZE),
                ("Page", "1"),
            ]);
        if let Some(key) = self.config.credential("USAJOBS_API_KEY") {
            req = req.header("Authorization-Key", key);
        }
        let body = fetch_text(req, self.config.timeout).await?;
        Self::parse_payload(&body, fetched_at)
    }
}
