//! Scam Sentinel — binary entrypoint.
//!
//! Boots the ops HTTP service: loads config, warms up the classifier (a load
//! failure aborts startup), and serves the check/stats/metrics surface. The
//! moderation pipeline itself is library API — a platform connector
//! constructs a `ModerationPipeline` with its `ChatGateway` implementation
//! and feeds it `InboundEvent`s.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scam_sentinel::api::{self, AppState};
use scam_sentinel::classifier::RemoteClassifier;
use scam_sentinel::config::AppConfig;
use scam_sentinel::dataset::JsonlDataset;
use scam_sentinel::detector::ScamDetector;
use scam_sentinel::metrics::Metrics;
use scam_sentinel::registry::FlaggedRegistry;
use scam_sentinel::stats::StatsTracker;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scam_sentinel=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when vars come from the environment.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load()?;

    // Startup is the only acceptable point of failure for the model.
    let classifier = Arc::new(RemoteClassifier::from_config(&cfg)?);
    classifier
        .warmup()
        .await
        .context("classifier failed to load, aborting startup")?;

    let detector = Arc::new(ScamDetector::new(classifier, cfg.threshold));
    let stats = Arc::new(StatsTracker::load(&cfg.stats_path));
    let dataset = Arc::new(JsonlDataset::new(&cfg.dataset_path));
    let registry = Arc::new(FlaggedRegistry::with_capacity(cfg.registry_capacity));

    let metrics = Metrics::init(cfg.threshold);

    let state = AppState {
        detector: Arc::clone(&detector),
        stats,
        dataset,
        registry,
    };
    let router = api::create_router(state).merge(metrics.router());

    tracing::info!(
        model = %detector.model_name(),
        threshold = detector.threshold(),
        bind = %cfg.bind_addr,
        "scam sentinel ready, watching for scam messages"
    );

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    axum::serve(listener, router).await.context("ops server failed")?;

    Ok(())
}
