//! Text-generation gateway.
//!
//! The engine consumes the LLM as an opaque collaborator behind a narrow
//! `generate(prompt) -> text` capability so call sites stay swappable and
//! mockable. Every caller owns its own prompt and its own fallback; a
//! gateway failure never propagates past this module's helpers.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EngineError;

/// Fallback prose answer when the collaborator fails or times out.
pub const FALLBACK_ANSWER: &str = "I could not find an exact match in the knowledge base, \
but based on experience, please try restarting the service and checking system logs.";

/// How much of the best article's content is quoted into the answer prompt.
const EXCERPT_CHARS: usize = 200;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, EngineError>;
}

// ─── Ollama ──────────────────────────────────────────────────────────────────

/// Ollama-compatible `/api/generate` client.
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, EngineError> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EngineError::Collaborator(format!("generate request failed: {e}")))?
            .error_for_status()
            .map_err(|e| EngineError::Collaborator(format!("generate returned error: {e}")))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EngineError::Collaborator(format!("generate body unreadable: {e}")))?;

        Ok(body
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

// ─── Answer generation ────────────────────────────────────────────────────────

/// First `EXCERPT_CHARS` characters of an article body, on a char boundary.
pub fn excerpt_of(content: &str) -> &str {
    match content.char_indices().nth(EXCERPT_CHARS) {
        Some((byte, _)) => &content[..byte],
        None => content,
    }
}

fn answer_prompt(ticket_text: &str, excerpt: Option<&str>) -> String {
    match excerpt {
        Some(excerpt) if !excerpt.trim().is_empty() => format!(
            "You are an AI support agent. A customer filed this ticket:\n\
             {ticket_text}\n\n\
             The most relevant knowledge-base article says:\n\
             {excerpt}\n\n\
             Write a short, direct answer for the customer based on the article."
        ),
        _ => format!(
            "You are an AI support agent. A customer filed this ticket:\n\
             {ticket_text}\n\n\
             No knowledge-base article matched. Suggest sensible first \
             troubleshooting steps in two or three sentences."
        ),
    }
}

/// Produce the prose answer for a ticket. Collaborator failure or an empty
/// completion degrades to `FALLBACK_ANSWER`; this function cannot fail.
pub async fn generate_answer(
    generator: &dyn TextGenerator,
    ticket_text: &str,
    excerpt: Option<&str>,
) -> String {
    match generator.generate(&answer_prompt(ticket_text, excerpt)).await {
        Ok(answer) if !answer.trim().is_empty() => answer,
        Ok(_) => {
            tracing::warn!("text generator returned an empty completion; using fallback");
            FALLBACK_ANSWER.to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "text generation failed; using fallback");
            FALLBACK_ANSWER.to_string()
        }
    }
}
