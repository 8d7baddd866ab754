//! Corpus admin API integration tests: reload and enrichment cycles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ractor::Actor;
use serde_json::Value;
use tower::ServiceExt;

use kb_engine::actors::usage::{UsageActor, UsageArguments};
use kb_engine::api;
use kb_engine::app_state::AppState;
use kb_engine::config::Config;
use kb_engine::corpus::CorpusStore;
use kb_engine::error::EngineError;
use kb_engine::gateway::TextGenerator;
use kb_engine::notifier::NullNotifier;
use shared_types::Article;

/// Replies with a fixed completion for every prompt.
struct CannedGenerator {
    reply: String,
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, EngineError> {
        Ok(self.reply.clone())
    }
}

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, EngineError> {
        Err(EngineError::Collaborator("connection refused".to_string()))
    }
}

struct TestApp {
    app: axum::Router,
    db_path: String,
    _temp_dir: tempfile::TempDir,
}

async fn setup_app(articles: &[Article], generator: Arc<dyn TextGenerator>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir
        .path()
        .join("admin_test.db")
        .to_str()
        .expect("Invalid database path")
        .to_string();

    {
        let store = CorpusStore::open(&db_path).expect("open corpus store");
        for article in articles {
            store.upsert_article(article).expect("seed article");
        }
    }

    let (usage, _handle) = Actor::spawn(
        None,
        UsageActor,
        UsageArguments {
            db_path: db_path.clone(),
        },
    )
    .await
    .expect("spawn UsageActor");

    let config = Config {
        port: 0,
        database_path: db_path.clone(),
        default_top_k: 3,
        ollama_base_url: "http://127.0.0.1:1".to_string(),
        ollama_model: "test".to_string(),
        generator_timeout: Duration::from_secs(1),
        slack_webhook_url: None,
        allowed_origins: vec![],
    };

    let app_state = Arc::new(AppState::new(config, usage, generator, Arc::new(NullNotifier)));

    let app = api::router().with_state(api::ApiState { app_state });

    TestApp {
        app,
        db_path,
        _temp_dir: temp_dir,
    }
}

fn untagged(article_id: &str, content: &str) -> Article {
    Article {
        article_id: article_id.to_string(),
        title: format!("Article {article_id}"),
        category: "General".to_string(),
        tags: vec![],
        content: content.to_string(),
    }
}

async fn post(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value: Value = serde_json::from_slice(&bytes).expect("Invalid JSON response");
    (status, value)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reload_publishes_the_index() {
    let t = setup_app(
        &[untagged("A1", "printer toner replacement steps")],
        Arc::new(FailingGenerator),
    )
    .await;

    let (status, body) = post(&t.app, "/corpus/reload").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["articles"], 1);

    // The recommend path sees the fresh snapshot immediately.
    let req = Request::builder()
        .method("POST")
        .uri("/recommend")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"ticket_text": "printer toner"}"#))
        .unwrap();
    let response = t.app.clone().oneshot(req).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn reload_of_an_empty_corpus_is_unprocessable() {
    let t = setup_app(&[], Arc::new(FailingGenerator)).await;

    let (status, body) = post(&t.app, "/corpus/reload").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "knowledge corpus is empty");
}

#[tokio::test]
async fn enrich_tags_untagged_articles_and_persists() {
    let reply = r#"Here you go:
{"category": "Hardware", "tags": ["printer", "toner", "maintenance"]}"#;
    let t = setup_app(
        &[
            untagged("A1", "printer toner replacement steps"),
            Article {
                article_id: "A2".to_string(),
                title: "Article A2".to_string(),
                category: "Accounts".to_string(),
                tags: vec!["password".to_string()],
                content: "password reset link".to_string(),
            },
        ],
        Arc::new(CannedGenerator {
            reply: reply.to_string(),
        }),
    )
    .await;

    let (status, body) = post(&t.app, "/corpus/enrich").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tagged"], 1);
    assert_eq!(body["skipped"], 0);
    assert_eq!(body["articles"], 2);

    // The suggestion reached the articles table.
    let store = CorpusStore::open(&t.db_path).expect("open corpus store");
    let articles = store.load_articles().expect("load articles");
    let a1 = articles.iter().find(|a| a.article_id == "A1").unwrap();
    assert_eq!(a1.category, "Hardware");
    assert_eq!(a1.tags, vec!["printer", "toner", "maintenance"]);

    // Already-tagged rows are left untouched.
    let a2 = articles.iter().find(|a| a.article_id == "A2").unwrap();
    assert_eq!(a2.category, "Accounts");
}

#[tokio::test]
async fn enrich_skips_articles_the_generator_cannot_classify() {
    let t = setup_app(
        &[untagged("A1", "printer toner replacement steps")],
        Arc::new(FailingGenerator),
    )
    .await;

    let (status, body) = post(&t.app, "/corpus/enrich").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tagged"], 0);
    assert_eq!(body["skipped"], 1);

    // The row stays eligible for a later pass.
    let store = CorpusStore::open(&t.db_path).expect("open corpus store");
    let articles = store.load_articles().expect("load articles");
    assert_eq!(articles[0].category, "General");
    assert!(articles[0].tags.is_empty());
}

#[tokio::test]
async fn enrich_tolerates_prose_around_the_json_object() {
    let reply = "Sure! The classification is:\n{\"category\": \"Network\", \"tags\": [\"vpn\"]}\nLet me know if you need anything else.";
    let t = setup_app(
        &[untagged("A1", "vpn connection troubleshooting")],
        Arc::new(CannedGenerator {
            reply: reply.to_string(),
        }),
    )
    .await;

    let (_, body) = post(&t.app, "/corpus/enrich").await;
    assert_eq!(body["tagged"], 1);

    let store = CorpusStore::open(&t.db_path).expect("open corpus store");
    let articles = store.load_articles().expect("load articles");
    assert_eq!(articles[0].category, "Network");
    assert_eq!(articles[0].tags, vec!["vpn"]);
}
