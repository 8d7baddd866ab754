//! Recommendation endpoint.
//!
//! The only failure a caller sees is the engine-not-initialized state. Usage
//! tracking, alerting, and answer generation all degrade without failing the
//! request: a dropped usage write logs a warning, the notifier is
//! fire-and-forget, and a dead text generator yields the fallback answer.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use shared_types::{RecommendResponse, TicketRequest};

use crate::actors::usage::UsageMsg;
use crate::api::ApiState;
use crate::classifier;
use crate::gateway;
use crate::scorer;

/// Recommend knowledge articles for one ticket
pub async fn recommend(
    State(state): State<ApiState>,
    Json(req): Json<TicketRequest>,
) -> impl IntoResponse {
    let app_state = &state.app_state;

    // Engine-not-initialized is the one Configuration-class request failure.
    let Some(index) = app_state.current_index() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "Knowledge base not loaded",
            })),
        )
            .into_response();
    };

    let top_k = req.top_k.unwrap_or(app_state.config().default_top_k);
    let recommendations = scorer::top_k(&req.ticket_text, &index, top_k);

    // ── Usage tracking + alerting (top-1 only, a deliberate scope choice) ──
    let mut excerpt: Option<String> = None;
    if let Some(top) = recommendations.first() {
        let usage = app_state.usage();
        let record = ractor::call!(usage, |reply| UsageMsg::Record {
            article_id: top.article_id.clone(),
            score: top.score,
            reply,
        });
        if let Err(e) = record {
            tracing::warn!(error = %e, article_id = %top.article_id, "usage record failed");
        }

        if classifier::should_alert(top.score) {
            let notifier = app_state.notifier();
            let ticket_text = req.ticket_text.clone();
            let top_result = top.clone();
            tokio::spawn(async move {
                notifier.notify(&ticket_text, &top_result).await;
            });
        }

        excerpt = index
            .article_by_id(&top.article_id)
            .map(|a| gateway::excerpt_of(&a.content).to_string());
    }

    // ── Prose answer (fallback on any collaborator failure) ────────────────
    let generator = app_state.generator();
    let ai_response =
        gateway::generate_answer(&*generator, &req.ticket_text, excerpt.as_deref()).await;

    let confidence = recommendations
        .first()
        .map(|top| classifier::confidence(top.score))
        .unwrap_or(shared_types::Confidence::Low);

    Json(RecommendResponse {
        recommendations,
        ai_response,
        confidence,
    })
    .into_response()
}
