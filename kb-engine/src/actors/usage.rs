//! UsageActor: durable per-article usage-aggregate store.
//!
//! The store is the single source of truth for usage: read fully into memory
//! at open, flushed to SQLite after every mutation (write-through, not
//! write-back). A crash immediately after a flush loses nothing; a crash
//! before a flush loses at most the in-flight update.
//!
//! Concurrency contract: all mutations go through this actor's mailbox, so
//! the sequence of (count, avg) transitions observed is equivalent to a
//! serial order of the `Record` calls: linearizable per `article_id` (and
//! globally). Write volume is bounded by human-driven ticket rates, so the
//! coarse serialization costs nothing in practice.
//!
//! Flush failures are retried once; if the retry also fails the in-memory
//! update is kept and a warning is logged. Usage counts are not silently
//! lost to a transient disk issue, but durability is not guaranteed across
//! a crash inside that window.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};

use shared_types::UsageAggregate;

use crate::error::EngineError;

/// Round to 3 decimals, the precision every stored and reported average
/// carries.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Thin wrapper around a rusqlite Connection plus the in-memory aggregate map.
///
/// All methods are synchronous; callers must use `tokio::task::spawn_blocking`.
pub struct UsageStore {
    conn: rusqlite::Connection,
    aggregates: BTreeMap<String, UsageAggregate>,
}

impl UsageStore {
    /// Open (or create) the store at the given SQLite path and load every
    /// aggregate into memory. Use `":memory:"` for in-process test stores.
    pub fn open(path: &str) -> Result<Self, EngineError> {
        let conn = if path == ":memory:" {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open(path)?
        };

        // WAL mode so the corpus reader and this writer can coexist on the
        // same file without contention.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS usage_aggregates (
                article_id TEXT PRIMARY KEY,
                usage_count INTEGER NOT NULL DEFAULT 0,
                avg_score REAL NOT NULL DEFAULT 0
            );
            "#,
        )?;

        // Tolerate schema drift from a prior version: add missing expected
        // columns with zero defaults instead of aborting.
        ensure_column(&conn, "usage_aggregates", "usage_count", "INTEGER DEFAULT 0")?;
        ensure_column(&conn, "usage_aggregates", "avg_score", "REAL DEFAULT 0")?;

        let mut aggregates = BTreeMap::new();
        {
            let mut stmt =
                conn.prepare("SELECT article_id, usage_count, avg_score FROM usage_aggregates")?;
            let rows = stmt.query_map([], |row| {
                Ok(UsageAggregate {
                    article_id: row.get(0)?,
                    // NULL fields from partially-written state read as zero.
                    usage_count: row.get::<_, Option<i64>>(1)?.unwrap_or(0).max(0) as u64,
                    avg_score: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                })
            })?;
            for row in rows {
                let aggregate = row?;
                aggregates.insert(aggregate.article_id.clone(), aggregate);
            }
        }

        Ok(UsageStore { conn, aggregates })
    }

    /// Apply one top-1 recommendation event: create a fresh aggregate or fold
    /// the score into the running mean, then write the whole store through to
    /// disk. Returns the post-update aggregate.
    pub fn record(&mut self, article_id: &str, score: f64) -> UsageAggregate {
        let aggregate = match self.aggregates.get(article_id) {
            Some(previous) => {
                let new_count = previous.usage_count + 1;
                let new_avg = round3(
                    (previous.avg_score * previous.usage_count as f64 + score) / new_count as f64,
                );
                UsageAggregate {
                    article_id: article_id.to_string(),
                    usage_count: new_count,
                    avg_score: new_avg,
                }
            }
            None => UsageAggregate {
                article_id: article_id.to_string(),
                usage_count: 1,
                avg_score: round3(score),
            },
        };
        self.aggregates
            .insert(article_id.to_string(), aggregate.clone());

        if let Err(first) = self.flush() {
            tracing::warn!(error = %first, article_id, "usage flush failed; retrying once");
            if let Err(second) = self.flush() {
                tracing::warn!(
                    error = %second,
                    article_id,
                    "usage flush failed twice; in-memory aggregate kept, durability degraded"
                );
            }
        }

        aggregate
    }

    pub fn get(&self, article_id: &str) -> Option<UsageAggregate> {
        self.aggregates.get(article_id).cloned()
    }

    /// Every aggregate, ascending by `article_id`.
    pub fn list_all(&self) -> Vec<UsageAggregate> {
        self.aggregates.values().cloned().collect()
    }

    /// Rewrite the whole table from the in-memory map in one transaction.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM usage_aggregates", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO usage_aggregates(article_id, usage_count, avg_score) VALUES (?, ?, ?)",
            )?;
            for aggregate in self.aggregates.values() {
                stmt.execute(rusqlite::params![
                    aggregate.article_id,
                    aggregate.usage_count as i64,
                    aggregate.avg_score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn ensure_column(
    conn: &rusqlite::Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<(), EngineError> {
    let sql = format!("PRAGMA table_info({table})");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(());
        }
    }
    conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition};"))?;
    Ok(())
}

// ─── Public actor types ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct UsageActor;

#[derive(Clone)]
pub struct UsageArguments {
    /// Path to the SQLite file for the usage store. Use `":memory:"` for tests.
    pub db_path: String,
}

pub struct UsageState {
    /// Thread-safe handle shared with `spawn_blocking` closures.
    pub(crate) inner: Arc<Mutex<UsageStore>>,
}

// ─── Message types ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum UsageMsg {
    /// One top-1 recommendation event. Replies with the post-update
    /// aggregate so callers observe the write they issued.
    Record {
        article_id: String,
        score: f64,
        reply: RpcReplyPort<UsageAggregate>,
    },

    /// Read one aggregate.
    Get {
        article_id: String,
        reply: RpcReplyPort<Option<UsageAggregate>>,
    },

    /// Read every aggregate, ascending by `article_id`.
    ListAll {
        reply: RpcReplyPort<Vec<UsageAggregate>>,
    },
}

// ─── Actor implementation ─────────────────────────────────────────────────────

#[async_trait]
impl Actor for UsageActor {
    type Msg = UsageMsg;
    type State = UsageState;
    type Arguments = UsageArguments;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let db_path = args.db_path.clone();

        let inner = tokio::task::spawn_blocking(move || {
            let store =
                UsageStore::open(&db_path).map_err(|e| format!("UsageStore::open: {e}"))?;
            Ok::<_, String>(Arc::new(Mutex::new(store)))
        })
        .await
        .map_err(|e| format!("spawn_blocking panicked: {e}"))?
        .map_err(|e: String| e)?;

        tracing::info!("UsageActor started (db={})", args.db_path);

        Ok(UsageState { inner })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            // ── Record ────────────────────────────────────────────────────────
            UsageMsg::Record {
                article_id,
                score,
                reply,
            } => {
                let inner = Arc::clone(&state.inner);
                let aggregate = tokio::task::spawn_blocking(move || {
                    let mut guard = inner.lock().expect("UsageStore lock poisoned");
                    guard.record(&article_id, score)
                })
                .await?;

                let _ = reply.send(aggregate);
            }

            // ── Get ───────────────────────────────────────────────────────────
            UsageMsg::Get { article_id, reply } => {
                let inner = Arc::clone(&state.inner);
                let aggregate = tokio::task::spawn_blocking(move || {
                    let guard = inner.lock().expect("UsageStore lock poisoned");
                    guard.get(&article_id)
                })
                .await
                .unwrap_or(None);

                let _ = reply.send(aggregate);
            }

            // ── ListAll ───────────────────────────────────────────────────────
            UsageMsg::ListAll { reply } => {
                let inner = Arc::clone(&state.inner);
                let aggregates = tokio::task::spawn_blocking(move || {
                    let guard = inner.lock().expect("UsageStore lock poisoned");
                    guard.list_all()
                })
                .await
                .unwrap_or_default();

                let _ = reply.send(aggregates);
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        // Final flush at teardown. Write-through makes this a no-op unless a
        // previous flush failed and left the in-memory map ahead of disk.
        let inner = Arc::clone(&state.inner);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = inner.lock().expect("UsageStore lock poisoned");
            guard.flush()
        })
        .await;

        match result {
            Ok(Ok(())) => tracing::info!("UsageActor stopped; final flush complete"),
            Ok(Err(e)) => tracing::warn!(error = %e, "final usage flush failed"),
            Err(e) => tracing::warn!(error = %e, "final usage flush panicked"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::round3;

    #[test]
    fn round3_half_up() {
        assert_eq!(round3(0.7004), 0.7);
        assert_eq!(round3(0.7006), 0.701);
        assert_eq!(round3((0.8 + 0.6) / 2.0), 0.7);
    }
}
