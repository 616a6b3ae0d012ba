// src/metrics.rs
//! Prometheus export for the categorizer and board counters.

use axum::{http::header, routing::get, Router};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder. Fails if one is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!(
            "ideas_categorized_total",
            "Ideas turned into cards, by funnel stage and deciding rule"
        );
        describe_counter!("board_mutations_total", "Board changes, by operation");

        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let body = handle.render();
                async move { ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body) }
            }),
        )
    }
}
