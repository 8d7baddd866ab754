//! HTTP API routes for the KB engine.
//!
//! Stateless bridge between HTTP callers (the dashboard, the ticket intake)
//! and the engine core: scoring runs against the published index snapshot,
//! usage mutations go through the UsageActor, and admin routes drive corpus
//! reload/enrichment.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

pub mod corpus_admin;
pub mod recommend;
pub mod report;

use crate::app_state::AppState;

#[derive(Clone)]
pub struct ApiState {
    pub app_state: Arc<AppState>,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend", post(recommend::recommend))
        // Reporting routes
        .route("/report/kb-health", get(report::kb_health))
        .route("/report/article-performance", get(report::article_performance))
        .route("/report/content-gaps", get(report::content_gaps))
        // Corpus admin routes
        .route("/corpus/reload", post(corpus_admin::reload_corpus))
        .route("/corpus/enrich", post(corpus_admin::enrich_corpus))
}

async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    let kb_loaded = state.app_state.current_index().is_some();
    Json(json!({
        "status": "healthy",
        "service": "kb-engine",
        "kb_loaded": kb_loaded,
    }))
}
