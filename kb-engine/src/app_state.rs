//! Process-wide engine state.
//!
//! The published `CorpusIndex` lives behind a single `RwLock<Option<Arc<..>>>`
//! slot: scorers clone the `Arc` and work on an immutable snapshot, and a
//! rebuild replaces the whole snapshot in one swap; a concurrent scoring
//! call can never observe a partially-updated index. All usage mutations go
//! through the `UsageActor` mailbox.

use std::sync::{Arc, RwLock};

use ractor::ActorRef;

use crate::actors::usage::UsageMsg;
use crate::config::Config;
use crate::corpus::CorpusStore;
use crate::error::EngineError;
use crate::gateway::TextGenerator;
use crate::index::{CorpusIndex, IndexConfig};
use crate::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    usage: ActorRef<UsageMsg>,
    generator: Arc<dyn TextGenerator>,
    notifier: Arc<dyn Notifier>,
    index: RwLock<Option<Arc<CorpusIndex>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        usage: ActorRef<UsageMsg>,
        generator: Arc<dyn TextGenerator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                usage,
                generator,
                notifier,
                index: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn usage(&self) -> ActorRef<UsageMsg> {
        self.inner.usage.clone()
    }

    pub fn generator(&self) -> Arc<dyn TextGenerator> {
        Arc::clone(&self.inner.generator)
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// The current immutable corpus snapshot, or `None` before the first
    /// successful load, the engine-not-initialized state.
    pub fn current_index(&self) -> Option<Arc<CorpusIndex>> {
        self.inner
            .index
            .read()
            .expect("index lock poisoned")
            .clone()
    }

    /// Atomically publish a freshly built snapshot.
    pub fn publish_index(&self, index: Arc<CorpusIndex>) {
        *self.inner.index.write().expect("index lock poisoned") = Some(index);
    }

    /// Load the corpus table, fit a new vector space, and publish it.
    /// Stop-the-world relative to scorers only in the sense that they keep
    /// the old snapshot until the swap. Returns the number of articles
    /// indexed.
    pub async fn reload_corpus(&self) -> Result<usize, EngineError> {
        let db_path = self.inner.config.database_path.clone();

        let index = tokio::task::spawn_blocking(move || {
            let store = CorpusStore::open(&db_path)?;
            let articles = store.load_articles()?;
            CorpusIndex::build(articles, &IndexConfig::default())
        })
        .await
        .map_err(|e| EngineError::Configuration(format!("corpus load task panicked: {e}")))??;

        let count = index.articles.len();
        let vocabulary = index.space.vocabulary_len();
        self.publish_index(Arc::new(index));
        tracing::info!(articles = count, vocabulary, "corpus index published");
        Ok(count)
    }
}
