//! Job aggregator service: binary entrypoint.
//! Boots the Axum HTTP server on the Shuttle runtime, wiring the aggregator,
//! the JSON API and the Prometheus endpoint.

use job_aggregator::api::{self, AppState};
use job_aggregator::metrics::Metrics;
use job_aggregator::telemetry;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env before the subscriber so RUST_LOG / LOG_FORMAT from it apply.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let (settings, aggregator) = job_aggregator::bootstrap()?;
    let metrics = Metrics::init(&aggregator)
        .map_err(|e| tracing::warn!(error = ?e, "metrics endpoint disabled"))
        .ok();

    let state = AppState::new(aggregator, settings.request_timeout());
    let mut router = api::router(state);
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }

    Ok(router.into())
}
