use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder, register the pipeline counters,
    /// and expose a static gauge with the configured scam threshold.
    pub fn init(threshold: f32) -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!(
            "messages_analyzed_total",
            "Messages that passed filtering and were analyzed"
        );
        describe_counter!("messages_flagged_total", "Messages flagged as scam");
        describe_counter!(
            "false_alarms_total",
            "Flagged messages reversed by a moderator"
        );
        gauge!("scam_confidence_threshold").set(threshold as f64);

        Self { handle }
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
