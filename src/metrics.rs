// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::FeedConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe the
    /// feed series so they show up before the first request.
    pub fn init(cfg: &FeedConfig) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("feed_requests_total", "Feed requests received.");
        describe_counter!(
            "feed_upstream_errors_total",
            "Search collaborator calls that failed."
        );
        describe_counter!(
            "feed_candidates_total",
            "Raw candidates returned per cohort language."
        );
        describe_counter!("feed_selected_total", "Articles chosen by the allocator.");
        describe_counter!(
            "feed_enrichment_fallback_total",
            "Enrichment steps that used their local fallback."
        );

        // Static gauges with the active policy
        gauge!("feed_window_hours").set(cfg.window_hours);
        gauge!("feed_capacity").set(cfg.quota.capacity as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
