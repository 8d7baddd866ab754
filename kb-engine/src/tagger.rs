//! Auto-tagger: assigns category and tags to untagged articles via the
//! text-generation collaborator.
//!
//! The LLM's output is untrusted: the first `{...}` object is extracted by
//! regex from whatever prose surrounds it, fields are coerced to clean
//! strings, and anything unparseable degrades to the `Uncategorized`
//! default. An enrichment pass therefore never fails on a single bad
//! completion.

use regex::Regex;
use std::sync::OnceLock;

use shared_types::TagSuggestion;

use crate::gateway::TextGenerator;

/// At most this many tags are kept per article.
const MAX_TAGS: usize = 5;

fn json_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Extract the first JSON object embedded in free-form model output.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let raw = json_object_pattern().find(text)?.as_str();
    serde_json::from_str(raw).ok()
}

fn classification_prompt(article_text: &str) -> String {
    format!(
        "You are an AI that classifies customer support knowledge articles.\n\n\
         Return ONLY valid JSON.\n\
         Do NOT include schema, titles, or extra fields.\n\n\
         Required fields:\n\
         - category (string)\n\
         - tags (array of strings)\n\n\
         Article:\n{article_text}"
    )
}

fn parse_suggestion(value: serde_json::Value) -> TagSuggestion {
    let category = value
        .get("category")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("Uncategorized")
        .to_string();

    let tags = value
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|t| t.as_str())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .take(MAX_TAGS)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    TagSuggestion { category, tags }
}

/// Classify one article body. Any collaborator or parse failure yields the
/// `Uncategorized` default rather than an error.
pub async fn auto_tag(generator: &dyn TextGenerator, article_text: &str) -> TagSuggestion {
    let response = match generator.generate(&classification_prompt(article_text)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "auto-tag generation failed");
            return TagSuggestion::default();
        }
    };

    match extract_json(&response) {
        Some(value) => parse_suggestion(value),
        None => {
            tracing::warn!("auto-tag response contained no JSON object");
            TagSuggestion::default()
        }
    }
}
