use axum::http::{header, HeaderValue, Method};
use ractor::Actor;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use kb_engine::actors::usage::{UsageActor, UsageArguments};
use kb_engine::api;
use kb_engine::app_state::AppState;
use kb_engine::config::Config;
use kb_engine::gateway::OllamaGenerator;
use kb_engine::notifier::{Notifier, NullNotifier, SlackNotifier};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Starting KB Engine API Server");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let db_path = std::path::PathBuf::from(&config.database_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create data directory");
    }
    tracing::info!("Using database: {}", config.database_path);

    // UsageActor owns the durable aggregate store; its mailbox serializes
    // every read-modify-write.
    let (usage, _usage_handle) = Actor::spawn(
        Some(format!("usage:{}", ulid::Ulid::new())),
        UsageActor,
        UsageArguments {
            db_path: config.database_path.clone(),
        },
    )
    .await
    .expect("Failed to create usage store actor");

    let generator = Arc::new(OllamaGenerator::new(
        &config.ollama_base_url,
        &config.ollama_model,
        config.generator_timeout,
    ));

    let notifier: Arc<dyn Notifier> = match config.slack_webhook_url.as_deref() {
        Some(url) => {
            tracing::info!("Slack content-gap alerts enabled");
            Arc::new(SlackNotifier::new(url))
        }
        None => {
            tracing::info!("No SLACK_WEBHOOK_URL set; content-gap alerts disabled");
            Arc::new(NullNotifier)
        }
    };

    let app_state = Arc::new(AppState::new(config.clone(), usage, generator, notifier));

    // Load the corpus and fit the vector space in the background so the API
    // comes up immediately; /recommend reports "not loaded" until publish.
    {
        let app_state = Arc::clone(&app_state);
        tokio::spawn(async move {
            match app_state.reload_corpus().await {
                Ok(articles) => tracing::info!(articles, "knowledge base loaded and vectorized"),
                Err(e) => tracing::error!(error = %e, "knowledge base load failed"),
            }
        });
    }

    // Configure CORS for the dashboard origins
    let allowed_origins = config
        .allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin).expect("Invalid CORS origin"))
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let api_state = api::ApiState { app_state };
    let app = api::router().with_state(api_state).layer(cors);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting HTTP server on http://{bind_addr}");
    let listener = TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
