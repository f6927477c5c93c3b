// src/ingest/http.rs
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};

use crate::config::sources::SourceConfig;
use crate::ingest::error::SourceError;

pub const USER_AGENT: &str = concat!("job-aggregator/", env!("CARGO_PKG_VERSION"));

/// One client per adapter, bounded by the adapter's own timeout.
pub fn build_client(config: &SourceConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .build()
        .context("building http client")
}

/// Send and read the body, mapping every failure into a `SourceError`.
pub async fn fetch_text(req: RequestBuilder, timeout: Duration) -> Result<String, SourceError> {
    let resp = req.send().await.map_err(|e| classify(e, timeout))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    resp.text().await.map_err(|e| classify(e, timeout))
}

fn classify(e: reqwest::Error, timeout: Duration) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout(timeout)
    } else {
        SourceError::Transport(e.to_string())
    }
}
