//! Corpus admin endpoints: reload and enrichment.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::api::ApiState;
use crate::corpus::{CorpusStore, DEFAULT_CATEGORY};
use crate::error::EngineError;
use crate::tagger;

/// Rebuild the vector space from the articles table and publish it
/// atomically. Scorers keep the previous snapshot until the swap.
pub async fn reload_corpus(State(state): State<ApiState>) -> impl IntoResponse {
    match state.app_state.reload_corpus().await {
        Ok(articles) => Json(json!({
            "success": true,
            "articles": articles,
        }))
        .into_response(),
        Err(e) => {
            let status = match e {
                EngineError::EmptyCorpus => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::error!(error = %e, "corpus reload failed");
            (
                status,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Auto-tag every article still carrying the default category and no tags,
/// persist the suggestions, then republish the index. Per-article
/// collaborator failures are tolerated and counted, never fatal.
pub async fn enrich_corpus(State(state): State<ApiState>) -> impl IntoResponse {
    let db_path = state.app_state.config().database_path.clone();

    let articles = match tokio::task::spawn_blocking({
        let db_path = db_path.clone();
        move || CorpusStore::open(&db_path)?.load_articles()
    })
    .await
    .unwrap_or_else(|e| Err(EngineError::Configuration(format!("corpus load panicked: {e}"))))
    {
        Ok(articles) => articles,
        Err(e) => {
            tracing::error!(error = %e, "corpus load for enrichment failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    let generator = state.app_state.generator();
    let mut suggestions = Vec::new();
    let mut skipped = 0usize;

    for article in articles
        .iter()
        .filter(|a| a.category == DEFAULT_CATEGORY && a.tags.is_empty())
    {
        let suggestion = tagger::auto_tag(&*generator, &article.content).await;
        // The Uncategorized default means the collaborator gave us nothing
        // usable; leave the row alone so a later pass can retry it.
        if suggestion.category == "Uncategorized" && suggestion.tags.is_empty() {
            skipped += 1;
            continue;
        }
        suggestions.push((article.article_id.clone(), suggestion));
    }

    let tagged = suggestions.len();
    if tagged > 0 {
        let write = tokio::task::spawn_blocking({
            let db_path = db_path.clone();
            move || {
                let store = CorpusStore::open(&db_path)?;
                for (article_id, suggestion) in &suggestions {
                    store.update_tags(article_id, &suggestion.category, &suggestion.tags)?;
                }
                Ok::<_, EngineError>(())
            }
        })
        .await
        .unwrap_or_else(|e| Err(EngineError::Configuration(format!("tag write panicked: {e}"))));

        if let Err(e) = write {
            tracing::error!(error = %e, "persisting tag suggestions failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response();
        }
    }

    let articles_indexed = match state.app_state.reload_corpus().await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(error = %e, "index rebuild after enrichment failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    Json(json!({
        "success": true,
        "tagged": tagged,
        "skipped": skipped,
        "articles": articles_indexed,
    }))
    .into_response()
}
