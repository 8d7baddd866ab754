//! Similarity scorer: ranks a corpus snapshot against one ticket query.
//!
//! Read-only over an immutable `CorpusIndex`; any number of scoring calls may
//! run in parallel without coordination. Selection always sorts the full
//! result set (no partial-selection shortcut) so the `article_id` tie-break
//! stays deterministic and auditable.

use shared_types::RankedResult;

use crate::error::EngineError;
use crate::index::CorpusIndex;

/// Score every article against the query, sorted descending by score with
/// ties broken by ascending `article_id`. A query with no usable tokens is
/// `EmptyQuery`; `top_k` absorbs it into an empty result set.
pub fn score_all(query: &str, index: &CorpusIndex) -> Result<Vec<RankedResult>, EngineError> {
    let query_vector = index.space.query_vector(query);
    if query_vector.is_empty() {
        return Err(EngineError::EmptyQuery);
    }

    let mut results: Vec<RankedResult> = index
        .articles
        .iter()
        .enumerate()
        .map(|(doc, article)| RankedResult {
            article_id: article.article_id.clone(),
            title: article.title.clone(),
            category: article.category.clone(),
            tags: article.tags.clone(),
            // Guard against float drift fractionally outside [0, 1].
            score: index.space.similarity(&query_vector, doc).clamp(0.0, 1.0),
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.article_id.cmp(&b.article_id))
    });
    Ok(results)
}

/// Top-`k` ranked results; `k` is clamped to at least 1. An unscorable
/// query degrades to an empty result set; absence of matches is a
/// reportable outcome, not a request failure.
pub fn top_k(query: &str, index: &CorpusIndex, k: usize) -> Vec<RankedResult> {
    match score_all(query, index) {
        Ok(mut results) => {
            results.truncate(k.max(1));
            results
        }
        Err(e) => {
            tracing::debug!(error = %e, "query produced no scorable terms");
            Vec::new()
        }
    }
}
