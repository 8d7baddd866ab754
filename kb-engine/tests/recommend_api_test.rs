//! Recommendation API integration tests: full HTTP request/response cycles
//! over the axum router with a seeded corpus and an in-process usage store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ractor::Actor;
use serde_json::{json, Value};
use tower::ServiceExt;

use kb_engine::actors::usage::{UsageActor, UsageArguments, UsageMsg};
use kb_engine::api;
use kb_engine::app_state::AppState;
use kb_engine::config::Config;
use kb_engine::corpus::CorpusStore;
use kb_engine::error::EngineError;
use kb_engine::gateway::{TextGenerator, FALLBACK_ANSWER};
use kb_engine::notifier::Notifier;
use shared_types::RankedResult;

// ─── Test doubles ────────────────────────────────────────────────────────────

struct CannedGenerator(&'static str);

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, EngineError> {
        Ok(self.0.to_string())
    }
}

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, EngineError> {
        Err(EngineError::Collaborator("connection refused".to_string()))
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    alerts: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, ticket_text: &str, top_result: &RankedResult) {
        self.alerts
            .lock()
            .unwrap()
            .push((ticket_text.to_string(), top_result.article_id.clone()));
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn test_config(database_path: String) -> Config {
    Config {
        port: 0,
        database_path,
        default_top_k: 3,
        ollama_base_url: "http://127.0.0.1:1".to_string(),
        ollama_model: "test".to_string(),
        generator_timeout: Duration::from_secs(1),
        slack_webhook_url: None,
        allowed_origins: vec![],
    }
}

struct TestApp {
    app: axum::Router,
    app_state: Arc<AppState>,
    notifier: RecordingNotifier,
    _temp_dir: tempfile::TempDir,
}

async fn setup_app(
    articles: &[(&str, &str, &str)],
    generator: Arc<dyn TextGenerator>,
    load_corpus: bool,
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir
        .path()
        .join("engine_test.db")
        .to_str()
        .expect("Invalid database path")
        .to_string();

    {
        let store = CorpusStore::open(&db_path).expect("open corpus store");
        for (article_id, title, content) in articles {
            store
                .upsert_article(&shared_types::Article {
                    article_id: article_id.to_string(),
                    title: title.to_string(),
                    category: "General".to_string(),
                    tags: vec![],
                    content: content.to_string(),
                })
                .expect("seed article");
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

    let notifier = RecordingNotifier::default();
    let app_state = Arc::new(AppState::new(
        test_config(db_path),
        usage,
        generator,
        Arc::new(notifier.clone()),
    ));

    if load_corpus {
        app_state
            .reload_corpus()
            .await
            .expect("initial corpus load");
    }

    let app = api::router().with_state(api::ApiState {
        app_state: Arc::clone(&app_state),
    });

    TestApp {
        app,
        app_state,
        notifier,
        _temp_dir: temp_dir,
    }
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
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

fn password_corpus() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("A1", "Password reset", "reset password link email"),
        ("A2", "Billing", "invoice billing subscription charge"),
    ]
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recommend_before_load_is_a_configuration_failure() {
    let t = setup_app(&password_corpus(), Arc::new(CannedGenerator("hi")), false).await;

    let (status, body) = post_json(
        &t.app,
        "/recommend",
        json!({"ticket_text": "I forgot my password"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Knowledge base not loaded");
}

#[tokio::test]
async fn forgot_password_recommends_the_password_article() {
    let t = setup_app(&password_corpus(), Arc::new(CannedGenerator("Use the reset link.")), true)
        .await;

    let (status, body) = post_json(
        &t.app,
        "/recommend",
        json!({"ticket_text": "I forgot my password", "top_k": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0]["article_id"], "A1");
    assert!(recommendations[0]["score"].as_f64().unwrap() > 0.0);
    assert_eq!(body["ai_response"], "Use the reset link.");
}

#[tokio::test]
async fn recommend_records_top1_usage_only() {
    let t = setup_app(&password_corpus(), Arc::new(CannedGenerator("ok")), true).await;

    let (status, _) = post_json(
        &t.app,
        "/recommend",
        json!({"ticket_text": "I forgot my password", "top_k": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let usage = t.app_state.usage();
    let all = ractor::call!(usage, |reply| UsageMsg::ListAll { reply }).expect("list rpc");

    // Both articles were returned, but only the top-1 accrues usage credit.
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].article_id, "A1");
    assert_eq!(all[0].usage_count, 1);
}

#[tokio::test]
async fn low_score_triggers_the_notifier() {
    // Content shares exactly one weak term with the query, so the top score
    // lands below the alert threshold.
    let t = setup_app(
        &[
            ("A1", "Printers", "printer toner cartridge jam tray paper feed roller duplex"),
            ("A2", "Billing", "invoice billing subscription charge refund proration"),
        ],
        Arc::new(CannedGenerator("ok")),
        true,
    )
    .await;

    let (status, body) = post_json(
        &t.app,
        "/recommend",
        json!({"ticket_text": "my printer screen keyboard mouse cable desk chair lamp", "top_k": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let top_score = body["recommendations"][0]["score"].as_f64().unwrap();
    assert!(top_score < 0.3, "expected alert-range score, got {top_score}");
    assert_eq!(body["confidence"], "low");

    // notify() runs on a spawned task; give it a beat.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let alerts = t.notifier.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].1, "A1");
}

#[tokio::test]
async fn generator_failure_degrades_to_fallback_answer() {
    let t = setup_app(&password_corpus(), Arc::new(FailingGenerator), true).await;

    let (status, body) = post_json(
        &t.app,
        "/recommend",
        json!({"ticket_text": "I forgot my password"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "collaborator failure must not fail the request");
    assert_eq!(body["ai_response"], FALLBACK_ANSWER);
    assert_eq!(body["recommendations"][0]["article_id"], "A1");
}

#[tokio::test]
async fn empty_query_yields_empty_recommendations_not_an_error() {
    let t = setup_app(&password_corpus(), Arc::new(CannedGenerator("ok")), true).await;

    let (status, body) = post_json(
        &t.app,
        "/recommend",
        json!({"ticket_text": "the of and"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["recommendations"].as_array().unwrap().is_empty());
    assert_eq!(body["confidence"], "low");

    // No match means no usage event.
    let usage = t.app_state.usage();
    let all = ractor::call!(usage, |reply| UsageMsg::ListAll { reply }).expect("list rpc");
    assert!(all.is_empty());
}

#[tokio::test]
async fn confidence_reflects_the_top_score() {
    let t = setup_app(&password_corpus(), Arc::new(CannedGenerator("ok")), true).await;

    // A query identical to A1's content scores ~1.0, high confidence.
    let (_, body) = post_json(
        &t.app,
        "/recommend",
        json!({"ticket_text": "reset password link email", "top_k": 1}),
    )
    .await;
    assert_eq!(body["confidence"], "high");
}

#[tokio::test]
async fn repeated_recommendations_fold_the_running_mean() {
    let t = setup_app(&password_corpus(), Arc::new(CannedGenerator("ok")), true).await;

    for _ in 0..3 {
        let (status, _) = post_json(
            &t.app,
            "/recommend",
            json!({"ticket_text": "reset password link email", "top_k": 1}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let usage = t.app_state.usage();
    let aggregate = ractor::call!(usage, |reply| UsageMsg::Get {
        article_id: "A1".to_string(),
        reply,
    })
    .expect("get rpc")
    .expect("aggregate exists");

    assert_eq!(aggregate.usage_count, 3);
    // Same query each time, so the mean equals the single observed score.
    assert!((0.0..=1.0).contains(&aggregate.avg_score));
}
