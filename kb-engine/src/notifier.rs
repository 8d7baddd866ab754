//! Content-gap alert notifier.
//!
//! The engine decides *when* to notify (top-1 score below the alert
//! threshold); delivery is this collaborator's problem. Notification is
//! fire-and-forget: failures are logged and never reach the recommend
//! caller.

use std::time::Duration;

use async_trait::async_trait;

use shared_types::RankedResult;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(3);

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a content-gap alert. Infallible from the caller's view.
    async fn notify(&self, ticket_text: &str, top_result: &RankedResult);
}

// ─── Slack ───────────────────────────────────────────────────────────────────

/// Slack incoming-webhook notifier.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            webhook_url: webhook_url.to_string(),
        }
    }

    fn payload(ticket_text: &str, top_result: &RankedResult) -> serde_json::Value {
        let confidence_pct = (top_result.score * 100.0) as i64;
        serde_json::json!({
            "text": "AI Content Gap Alert",
            "blocks": [
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!("*Ticket:* {ticket_text}"),
                    }
                },
                {
                    "type": "section",
                    "fields": [
                        {
                            "type": "mrkdwn",
                            "text": format!("*Article:* {}", top_result.title),
                        },
                        {
                            "type": "mrkdwn",
                            "text": format!("*Confidence:* {confidence_pct}%"),
                        }
                    ]
                }
            ]
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, ticket_text: &str, top_result: &RankedResult) {
        let payload = Self::payload(ticket_text, top_result);

        match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(article_id = %top_result.article_id, "content-gap alert sent");
            }
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    "slack webhook rejected content-gap alert"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "slack notification failed");
            }
        }
    }
}

// ─── Null ────────────────────────────────────────────────────────────────────

/// Drop-in notifier when no webhook is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _ticket_text: &str, top_result: &RankedResult) {
        tracing::debug!(
            article_id = %top_result.article_id,
            score = top_result.score,
            "content-gap alert suppressed (no webhook configured)"
        );
    }
}
