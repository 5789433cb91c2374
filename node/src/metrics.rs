//! # Prometheus Metrics
//!
//! Exposes operational metrics for the wallet node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics address.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with
//! the `wallet` prefix so they do not collide with any default global
//! registry consumers.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use wallet_ledger::HealthObserver;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct WalletMetrics {
    registry: Registry,
    /// Commands handled, by `api` and `outcome` (`NO_ERROR` or the error code).
    pub commands_total: IntCounterVec,
    /// Command handling latency in seconds, by `api`.
    pub command_latency_seconds: HistogramVec,
    /// 1 while the store answers probes, 0 while reconnecting.
    pub store_up: IntGauge,
    /// Reconnect attempts made by the connectivity monitor.
    pub store_reconnects_total: IntCounter,
}

impl WalletMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("wallet".into()), None)
            .expect("failed to create prometheus registry");

        let commands_total = IntCounterVec::new(
            Opts::new("commands_total", "Game-processor commands handled"),
            &["api", "outcome"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(commands_total.clone()))
            .expect("metric registration");

        let command_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "command_latency_seconds",
                "Game-processor command latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
            &["api"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(command_latency_seconds.clone()))
            .expect("metric registration");

        let store_up = IntGauge::new("store_up", "Whether the ledger store answers probes")
            .expect("metric creation");
        registry
            .register(Box::new(store_up.clone()))
            .expect("metric registration");

        let store_reconnects_total = IntCounter::new(
            "store_reconnects_total",
            "Reconnect attempts made after a failed store probe",
        )
        .expect("metric creation");
        registry
            .register(Box::new(store_reconnects_total.clone()))
            .expect("metric registration");

        Self {
            registry,
            commands_total,
            command_latency_seconds,
            store_up,
            store_reconnects_total,
        }
    }

    /// Records one handled command.
    pub fn observe_command(&self, api: &str, outcome: &str, elapsed: Duration) {
        self.commands_total.with_label_values(&[api, outcome]).inc();
        self.command_latency_seconds
            .with_label_values(&[api])
            .observe(elapsed.as_secs_f64());
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl HealthObserver for WalletMetrics {
    fn store_down(&self) {
        self.store_up.set(0);
    }

    fn reconnect_attempt(&self, _attempt: u32) {
        self.store_reconnects_total.inc();
    }

    fn store_up(&self) {
        self.store_up.set(1);
    }
}

/// Shared metrics state passed to axum handlers via `State`.
pub type SharedMetrics = Arc<WalletMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
