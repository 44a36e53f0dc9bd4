//! SQLite-backed relational store of statute articles.
//!
//! Table `articles(id, content, metadata)`; `metadata` is a JSON document
//! `{source, chapter, article, references}` queried with SQLite's JSON
//! functions.

use super::open_db;
use crate::statute::{ArticleNumber, StatuteArticle};
use crate::types::DbArticle;
use lawqa_core::{AppError, AppResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Params};
use std::path::{Path, PathBuf};

/// Relational article store persisted in a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteArticleStore {
    db_path: PathBuf,
}

impl SqliteArticleStore {
    /// Open the store, creating the table if needed.
    pub fn open(db_path: impl Into<PathBuf>) -> AppResult<Self> {
        let store = Self {
            db_path: db_path.into(),
        };

        let conn = store.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Store(format!("Failed to create articles table: {}", e)))?;

        tracing::debug!("Initialized article store at {:?}", store.db_path);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> AppResult<Connection> {
        open_db(&self.db_path)
    }

    /// Insert or replace parsed articles, tagging them with `source`.
    pub fn insert_articles(&self, articles: &[StatuteArticle], source: &str) -> AppResult<usize> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Store(format!("Failed to begin transaction: {}", e)))?;

        for article in articles {
            let mut metadata = article.metadata();
            if let Some(map) = metadata.as_object_mut() {
                map.insert("source".to_string(), source.into());
            }

            tx.execute(
                "INSERT OR REPLACE INTO articles (id, content, metadata) VALUES (?1, ?2, ?3)",
                params![
                    format!("{}:{}", source, article.article),
                    article.text,
                    serde_json::to_string(&metadata)?,
                ],
            )
            .map_err(|e| AppError::Store(format!("Failed to insert article: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Store(format!("Failed to commit articles: {}", e)))?;

        tracing::info!("Stored {} articles", articles.len());
        Ok(articles.len())
    }

    /// Articles whose content contains `query`, in insertion order, at most
    /// `limit` of them.
    pub fn keyword_search(&self, query: &str, limit: usize) -> AppResult<Vec<DbArticle>> {
        let pattern = format!("%{}%", escape_like(query));
        self.query(
            "SELECT content, metadata FROM articles
             WHERE content LIKE ?1 ESCAPE '\\'
             ORDER BY rowid LIMIT ?2",
            params![pattern, limit as i64],
        )
    }

    /// Articles whose `references` cite any of `numbers`.
    ///
    /// One containment predicate per number, OR-combined. An empty input returns an
    /// empty result without touching the database.
    pub fn search_by_numbers(&self, numbers: &[ArticleNumber]) -> AppResult<Vec<DbArticle>> {
        if numbers.is_empty() {
            return Ok(Vec::new());
        }

        let predicates: Vec<String> = (1..=numbers.len())
            .map(|i| {
                format!(
                    "EXISTS (SELECT 1 FROM json_each(metadata, '$.references') \
                     WHERE json_each.value = ?{i})"
                )
            })
            .collect();

        let sql = format!(
            "SELECT content, metadata FROM articles WHERE {} ORDER BY rowid",
            predicates.join(" OR ")
        );

        let bind: Vec<SqlValue> = numbers
            .iter()
            .map(|n| SqlValue::Text(n.as_str().to_string()))
            .collect();

        self.query(&sql, params_from_iter(bind.iter()))
    }

    /// Every stored article ordered by article number.
    pub fn list_all(&self) -> AppResult<Vec<DbArticle>> {
        let mut articles = self.query(
            "SELECT content, metadata FROM articles ORDER BY rowid",
            [],
        )?;

        articles.sort_by_key(|a| {
            let number = a
                .metadata
                .get("article")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            ArticleNumber::new(number)
        });

        Ok(articles)
    }

    /// Number of stored articles.
    pub fn count(&self) -> AppResult<u32> {
        let conn = self.connect()?;
        conn.query_row("SELECT COUNT(*) FROM articles", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Store(format!("Failed to count articles: {}", e)))
    }

    /// Delete every article.
    pub fn reset(&self) -> AppResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM articles", [])
            .map_err(|e| AppError::Store(format!("Failed to reset article store: {}", e)))?;

        tracing::info!("Reset article store");
        Ok(())
    }

    fn query<P: Params>(&self, sql: &str, params: P) -> AppResult<Vec<DbArticle>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params, |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| AppError::Store(format!("Failed to query articles: {}", e)))?;

        let mut articles = Vec::new();
        for row in rows {
            let (content, metadata_json) =
                row.map_err(|e| AppError::Store(format!("Failed to read article: {}", e)))?;
            articles.push(DbArticle {
                content,
                metadata: serde_json::from_str(&metadata_json)?,
            });
        }

        Ok(articles)
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
