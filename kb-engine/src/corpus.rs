//! CorpusStore: durable knowledge-article table.
//!
//! Thin wrapper around a rusqlite Connection. All methods are synchronous;
//! callers on the async path must use `tokio::task::spawn_blocking`.
//!
//! The `articles` table is the ingest boundary: rows are written by the
//! enrichment pipeline (or seeded by tests) and read wholesale into an
//! immutable `Vec<Article>` snapshot at index-build time. `content` is the
//! one required column; `category` and `tags` are optional with defaults.

use shared_types::Article;

use crate::error::EngineError;

pub const DEFAULT_CATEGORY: &str = "General";

pub struct CorpusStore {
    conn: rusqlite::Connection,
}

impl CorpusStore {
    /// Open (or create) the store at the given SQLite path.
    /// Use `":memory:"` for in-process test stores.
    pub fn open(path: &str) -> Result<Self, EngineError> {
        let conn = if path == ":memory:" {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open(path)?
        };

        // WAL mode so the usage store and corpus reader can coexist on the
        // same file without contention.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                article_id TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                category TEXT,
                tags TEXT,
                content TEXT
            );
            "#,
        )?;

        Ok(CorpusStore { conn })
    }

    /// Load the full corpus snapshot, ordered by `article_id`.
    ///
    /// A missing `content` column is a fatal configuration error (the table
    /// came from an incompatible source). A NULL `content` value is not: the
    /// article is indexed on its metadata with an empty body.
    pub fn load_articles(&self) -> Result<Vec<Article>, EngineError> {
        if !self.has_column("articles", "content")? {
            return Err(EngineError::Configuration(
                "articles table must contain a 'content' column".to_string(),
            ));
        }

        let mut stmt = self.conn.prepare(
            "SELECT article_id, title, category, tags, content
             FROM articles ORDER BY article_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Article {
                article_id: row.get(0)?,
                title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                category: normalize_category(row.get::<_, Option<String>>(2)?),
                tags: parse_tags(row.get::<_, Option<String>>(3)?),
                content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Insert or replace one article. Tags are stored comma-separated.
    pub fn upsert_article(&self, article: &Article) -> Result<(), EngineError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO articles(article_id, title, category, tags, content)
             VALUES (?, ?, ?, ?, ?)",
            rusqlite::params![
                article.article_id,
                article.title,
                article.category,
                article.tags.join(", "),
                article.content,
            ],
        )?;
        Ok(())
    }

    /// Overwrite category/tags for one article (enrichment pass).
    pub fn update_tags(
        &self,
        article_id: &str,
        category: &str,
        tags: &[String],
    ) -> Result<(), EngineError> {
        self.conn.execute(
            "UPDATE articles SET category = ?, tags = ? WHERE article_id = ?",
            rusqlite::params![category, tags.join(", "), article_id],
        )?;
        Ok(())
    }

    fn has_column(&self, table: &str, column: &str) -> Result<bool, EngineError> {
        let sql = format!("PRAGMA table_info({table})");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            if name == column {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn normalize_category(raw: Option<String>) -> String {
    match raw {
        Some(c) if !c.trim().is_empty() => c,
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

fn parse_tags(raw: Option<String>) -> Vec<String> {
    raw.map(|joined| {
        joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}
