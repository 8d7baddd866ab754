//! Reporting endpoints: thin HTTP shims over `crate::report`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use shared_types::UsageAggregate;

use crate::actors::usage::UsageMsg;
use crate::api::ApiState;
use crate::report;

async fn list_aggregates(state: &ApiState) -> Result<Vec<UsageAggregate>, impl IntoResponse> {
    let usage = state.app_state.usage();
    ractor::call!(usage, |reply| UsageMsg::ListAll { reply }).map_err(|e| {
        tracing::error!(error = %e, "usage store unavailable");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "Usage store unavailable",
            })),
        )
    })
}

/// Corpus health: totals plus mean relevance
pub async fn kb_health(State(state): State<ApiState>) -> impl IntoResponse {
    let aggregates = match list_aggregates(&state).await {
        Ok(aggregates) => aggregates,
        Err(response) => return response.into_response(),
    };

    let total_articles = state
        .app_state
        .current_index()
        .map(|index| index.articles.len())
        .unwrap_or(0);

    Json(report::kb_health(total_articles, &aggregates)).into_response()
}

/// All aggregates sorted by usage, most used first
pub async fn article_performance(State(state): State<ApiState>) -> impl IntoResponse {
    let aggregates = match list_aggregates(&state).await {
        Ok(aggregates) => aggregates,
        Err(response) => return response.into_response(),
    };

    Json(report::article_performance(&aggregates)).into_response()
}

/// Articles repeatedly matched with consistently low relevance
pub async fn content_gaps(State(state): State<ApiState>) -> impl IntoResponse {
    let aggregates = match list_aggregates(&state).await {
        Ok(aggregates) => aggregates,
        Err(response) => return response.into_response(),
    };

    Json(report::content_gaps(&aggregates)).into_response()
}
