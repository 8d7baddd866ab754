//! Shared types between the KB engine backend and the dashboard
//!
//! These types are used by both:
//! - the axum/ractor backend (native Rust)
//! - the dashboard (via generated TypeScript bindings)
//!
//! Serializable with serde for JSON over HTTP

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Corpus
// ============================================================================

/// One knowledge-base article. Immutable for the lifetime of a published
/// index; replaced wholesale on corpus reload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
pub struct Article {
    /// Unique id, stable across index rebuilds.
    pub article_id: String,
    pub title: String,
    /// Defaults to "General" when the source row has none.
    pub category: String,
    /// Ordered tags; empty when untagged.
    pub tags: Vec<String>,
    /// Text body used for vectorization. May be empty (metadata-only article).
    pub content: String,
}

/// Category/tags suggestion produced by the auto-tagger collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
pub struct TagSuggestion {
    pub category: String,
    pub tags: Vec<String>,
}

impl Default for TagSuggestion {
    fn default() -> Self {
        Self {
            category: "Uncategorized".to_string(),
            tags: Vec::new(),
        }
    }
}

// ============================================================================
// Recommendation
// ============================================================================

/// A single scored article, produced per query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
pub struct RankedResult {
    pub article_id: String,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Cosine similarity clamped to [0, 1].
    pub score: f64,
}

/// Confidence label derived from the top-1 score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// Inbound ticket query.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
pub struct TicketRequest {
    pub ticket_text: String,
    /// Defaults to the engine's configured top-k when omitted.
    pub top_k: Option<usize>,
}

/// Full response for one ticket query.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
pub struct RecommendResponse {
    pub recommendations: Vec<RankedResult>,
    /// Prose answer from the text-generation collaborator, or the fixed
    /// fallback string when the collaborator fails.
    pub ai_response: String,
    pub confidence: Confidence,
}

// ============================================================================
// Usage analytics
// ============================================================================

/// Durable per-article running statistics. `avg_score` is the arithmetic mean
/// of exactly `usage_count` observed top-1 scores, rounded to 3 decimals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
pub struct UsageAggregate {
    pub article_id: String,
    pub usage_count: u64,
    pub avg_score: f64,
}

/// Corpus health view. Untagged so an empty store serializes as a plain
/// `{"message": ...}` body rather than zeroed totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
#[serde(untagged)]
pub enum KbHealth {
    NoData { message: String },
    Report(KbHealthReport),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
pub struct KbHealthReport {
    pub total_articles: u64,
    pub actively_used_articles: u64,
    pub unused_articles: u64,
    /// Mean of `avg_score` across all aggregates, rounded to 3 decimals.
    pub average_relevance_score: f64,
    pub generated_at: DateTime<Utc>,
}

/// One row of the article-performance view. `avg_score` is `None` when the
/// stored value is not a finite number, so the JSON is always serializable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated.ts")]
pub struct PerformanceRow {
    pub article_id: String,
    pub usage_count: u64,
    pub avg_score: Option<f64>,
}
