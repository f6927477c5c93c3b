// src/metrics.rs
use anyhow::Context;
use axum::{http::header, routing::get, Router};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::ingest::Aggregator;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the static
    /// aggregator gauges. Call once per process.
    pub fn init(aggregator: &Aggregator) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_gauge!("ingest_max_results", "Configured result size cap.");
        describe_gauge!("ingest_sources_registered", "Sources wired into the aggregator.");
        gauge!("ingest_max_results").set(aggregator.max_results() as f64);
        gauge!("ingest_sources_registered").set(aggregator.source_names().len() as f64);

        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], h.render()) }
            }),
        )
    }
}
