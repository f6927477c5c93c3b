// src/api.rs
//! Thin serving shell over the aggregation core. Filtering by category/limit
//! happens here, after the core has produced its capped, ordered list.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::ingest::types::{CanonicalJob, Category, SourceReport};
use crate::ingest::Aggregator;

#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<Aggregator>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(aggregator: Aggregator, request_timeout: Duration) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            request_timeout,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/jobs", get(list_jobs))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    category: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    job: CanonicalJob,
    category_label: &'static str,
    category_slug: &'static str,
}

impl From<CanonicalJob> for JobView {
    fn from(job: CanonicalJob) -> Self {
        let category = job.category;
        Self {
            job,
            category_label: category.label(),
            category_slug: category.slug(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    count: usize,
    jobs: Vec<JobView>,
    sources: Vec<SourceReport>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: msg.into() }))
}

async fn list_jobs(
    State(state): State<AppState>,
    Query(q): Query<JobsQuery>,
) -> Result<Json<JobsResponse>, ApiError> {
    let category = match q.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => Some(Category::from_slug(slug).ok_or_else(|| {
            api_error(StatusCode::BAD_REQUEST, format!("unknown category '{slug}'"))
        })?),
        None => None,
    };

    let result = tokio::time::timeout(state.request_timeout, state.aggregator.run_once())
        .await
        .map_err(|_| {
            tracing::warn!(
                timeout_ms = state.request_timeout.as_millis() as u64,
                "aggregation deadline exceeded"
            );
            api_error(StatusCode::GATEWAY_TIMEOUT, "aggregation timed out")
        })?;

    let limit = q.limit.unwrap_or(usize::MAX);
    let jobs: Vec<JobView> = result
        .jobs
        .into_iter()
        .filter(|j| category.map_or(true, |c| j.category == c))
        .take(limit)
        .map(JobView::from)
        .collect();

    Ok(Json(JobsResponse {
        count: jobs.len(),
        jobs,
        sources: result.outcomes,
    }))
}
