//! # Prometheus Metrics
//!
//! Transaction counters and latency for the peer, served at `/metrics` on
//! the metrics port. Everything is registered in a dedicated
//! [`prometheus::Registry`] with the `tessera` prefix.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Metric handles for the node. Cheap to clone.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Transactions handled, by operation and outcome (`ok` or error kind).
    pub transactions_total: IntCounterVec,
    /// Wall time spent executing a transaction, in seconds.
    pub transaction_latency_seconds: Histogram,
    /// Successful ownership transfers.
    pub assets_transferred_total: IntCounter,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("tessera".into()), None)
            .expect("failed to create prometheus registry");

        let transactions_total = IntCounterVec::new(
            Opts::new(
                "transactions_total",
                "Transactions handled, labelled by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_total.clone()))
            .expect("metric registration");

        let transaction_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "transaction_latency_seconds",
                "Transaction execution latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(transaction_latency_seconds.clone()))
            .expect("metric registration");

        let assets_transferred_total = IntCounter::new(
            "assets_transferred_total",
            "Assets whose ownership moved to another organization",
        )
        .expect("metric creation");
        registry
            .register(Box::new(assets_transferred_total.clone()))
            .expect("metric registration");

        Self {
            registry,
            transactions_total,
            transaction_latency_seconds,
            assets_transferred_total,
        }
    }

    /// Record one finished transaction.
    pub fn observe(&self, operation: &str, outcome: &str, elapsed: Duration) {
        self.transactions_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.transaction_latency_seconds
            .observe(elapsed.as_secs_f64());
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// `GET /metrics`
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
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_transactions_are_encoded() {
        let metrics = NodeMetrics::new();
        metrics.observe("TransferAsset", "ok", Duration::from_millis(3));
        metrics.observe("TransferAsset", "PriceMismatch", Duration::from_millis(1));
        metrics.assets_transferred_total.inc();

        let text = metrics.encode().unwrap();
        assert!(text.contains(
            r#"tessera_transactions_total{operation="TransferAsset",outcome="PriceMismatch"} 1"#
        ));
        assert!(text.contains("tessera_assets_transferred_total 1"));
        assert!(text.contains("tessera_transaction_latency_seconds_count 2"));
    }
}
