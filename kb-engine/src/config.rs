use std::path::PathBuf;
use std::time::Duration;

use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the engine listens on
    pub port: u16,
    /// Path to the engine SQLite database (articles + usage aggregates)
    pub database_path: String,
    /// Default number of recommendations per query
    pub default_top_k: usize,
    /// Base URL of the Ollama-compatible text-generation service
    pub ollama_base_url: String,
    /// Model name passed to the text-generation service
    pub ollama_model: String,
    /// Upper bound on one text-generation call
    pub generator_timeout: Duration,
    /// Slack incoming-webhook URL for content-gap alerts; alerts are
    /// disabled when unset
    pub slack_webhook_url: Option<String>,
    /// Origins allowed to call the API (the dashboard)
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();

        let database_path = match std::env::var("KB_DATABASE_PATH") {
            Ok(v) => v,
            Err(_) => {
                // Default: <workspace root>/data/kb_engine.db, resolved at
                // compile time so the binary can be launched from anywhere.
                let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."));
                workspace_root
                    .join("data/kb_engine.db")
                    .to_string_lossy()
                    .to_string()
            }
        };

        Ok(Self {
            port: env_parse("KB_ENGINE_PORT", 8080)?,
            database_path,
            default_top_k: env_parse("KB_DEFAULT_TOP_K", 3)?,
            ollama_base_url: env_str("OLLAMA_BASE_URL", "http://localhost:11434"),
            ollama_model: env_str("OLLAMA_MODEL", "llama3.2:1b"),
            generator_timeout: Duration::from_secs(env_parse("KB_GENERATOR_TIMEOUT_SECS", 30)?),
            slack_webhook_url: std::env::var("SLACK_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            allowed_origins: env_csv(
                "KB_ALLOWED_ORIGINS",
                &["http://localhost:8501", "http://127.0.0.1:8501"],
            ),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, EngineError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|e| {
            EngineError::Configuration(format!("Failed to parse env var {key}={val}: {e}"))
        }),
        Err(_) => Ok(default),
    }
}

fn env_csv(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        Err(_) => default.iter().map(|s| (*s).to_string()).collect(),
    }
}
