//! Ops HTTP surface: manual checks and reporting.
//!
//! `/check` is the admin "would this be flagged?" probe (no side effects,
//! no counters touched); `/stats` and `/dataset` are read-only reporting.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::dataset::{DatasetSink, DatasetStats};
use crate::detector::ScamDetector;
use crate::registry::FlaggedRegistry;
use crate::stats::{ComprehensiveStats, StatsTracker};

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<ScamDetector>,
    pub stats: Arc<StatsTracker>,
    pub dataset: Arc<dyn DatasetSink>,
    pub registry: Arc<FlaggedRegistry>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/check", post(check))
        .route("/stats", get(stats))
        .route("/dataset", get(dataset))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct CheckReq {
    text: String,
}

#[derive(serde::Serialize)]
struct CheckResp {
    is_scam: bool,
    confidence: f32,
    reason: String,
    matched_rules: Vec<&'static str>,
}

async fn check(
    State(state): State<AppState>,
    Json(body): Json<CheckReq>,
) -> Result<Json<CheckResp>, (StatusCode, String)> {
    let verdict = state
        .detector
        .detect(&body.text)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("classification failed: {e}")))?;

    Ok(Json(CheckResp {
        is_scam: verdict.is_scam,
        confidence: verdict.confidence,
        reason: verdict.reason.as_str().to_string(),
        matched_rules: verdict.matched_rules,
    }))
}

#[derive(serde::Serialize)]
struct StatsResp {
    #[serde(flatten)]
    stats: ComprehensiveStats,
    model: String,
    threshold: f32,
    pending_reviews: usize,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResp> {
    Json(StatsResp {
        stats: state.stats.comprehensive(),
        model: state.detector.model_name().to_string(),
        threshold: state.detector.threshold(),
        pending_reviews: state.registry.len(),
    })
}

async fn dataset(
    State(state): State<AppState>,
) -> Result<Json<DatasetStats>, (StatusCode, String)> {
    state
        .dataset
        .stats()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("dataset stats failed: {e}")))
}
