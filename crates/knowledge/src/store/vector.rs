//! SQLite-backed vector store.
//!
//! Records carry a JSON metadata document. Metadata filters run in SQL via
//! `json_extract`; similarity is computed in process over the filtered rows.

use super::open_db;
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use lawqa_core::{AppError, AppResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A record to insert.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub content: String,
    pub metadata: Value,
    pub embedding: Vec<f32>,
}

/// A similarity search result. `distance` is `1 - cosine similarity`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub content: String,
    pub metadata: Value,
    pub distance: f32,
}

/// Text-in similarity search over a filtered collection.
#[async_trait::async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// Return up to `k` hits ordered by ascending distance. Every
    /// `filter` entry must equal the same top-level metadata field.
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: &Map<String, Value>,
    ) -> AppResult<Vec<VectorHit>>;
}

/// Vector store persisted in a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteVectorStore {
    db_path: PathBuf,
}

impl SqliteVectorStore {
    /// Open the store, creating tables if needed.
    pub fn open(db_path: impl Into<PathBuf>) -> AppResult<Self> {
        let store = Self {
            db_path: db_path.into(),
        };

        let conn = store.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Store(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Initialized vector store at {:?}", store.db_path);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> AppResult<Connection> {
        open_db(&self.db_path)
    }

    /// Insert or replace records in one transaction.
    pub fn insert(&self, records: &[VectorRecord]) -> AppResult<usize> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Store(format!("Failed to begin transaction: {}", e)))?;

        for record in records {
            let metadata_json = serde_json::to_string(&record.metadata)?;
            tx.execute(
                "INSERT OR REPLACE INTO records (id, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id,
                    record.content,
                    metadata_json,
                    embedding_to_bytes(&record.embedding),
                ],
            )
            .map_err(|e| AppError::Store(format!("Failed to insert record: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Store(format!("Failed to commit records: {}", e)))?;

        tracing::debug!("Inserted {} vector records", records.len());
        Ok(records.len())
    }

    /// Return the `k` records nearest to `query_embedding` among those
    /// matching `filter`.
    pub fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: &Map<String, Value>,
    ) -> AppResult<Vec<VectorHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut sql = String::from("SELECT content, metadata, embedding FROM records");
        let mut bind: Vec<SqlValue> = Vec::with_capacity(filter.len() * 2);

        for (i, (key, value)) in filter.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!(
                "json_extract(metadata, ?{}) = ?{}",
                bind.len() + 1,
                bind.len() + 2
            ));
            bind.push(SqlValue::Text(format!("$.{}", key)));
            bind.push(json_to_sql(key, value)?);
        }

        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params_from_iter(bind.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(|e| AppError::Store(format!("Failed to query records: {}", e)))?;

        let mut hits = Vec::new();
        for row in rows {
            let (content, metadata_json, embedding_bytes) =
                row.map_err(|e| AppError::Store(format!("Failed to read record: {}", e)))?;
            let embedding = bytes_to_embedding(&embedding_bytes)?;
            let metadata: Value = serde_json::from_str(&metadata_json)?;
            let distance = 1.0 - cosine_similarity(query_embedding, &embedding);

            hits.push(VectorHit {
                content,
                metadata,
                distance,
            });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);

        tracing::debug!("Retrieved {} records (requested top-{})", hits.len(), k);
        Ok(hits)
    }

    /// Number of stored records.
    pub fn count(&self) -> AppResult<u32> {
        let conn = self.connect()?;
        conn.query_row("SELECT COUNT(*) FROM records", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Store(format!("Failed to count records: {}", e)))
    }

    /// Delete every record and the recorded embedding settings.
    pub fn reset(&self) -> AppResult<()> {
        let conn = self.connect()?;
        conn.execute_batch("DELETE FROM records; DELETE FROM store_meta;")
            .map_err(|e| AppError::Store(format!("Failed to reset vector store: {}", e)))?;

        tracing::info!("Reset vector store");
        Ok(())
    }

    /// Delete every record stored under one retrieval source tag.
    pub fn delete_source(&self, source: &str) -> AppResult<usize> {
        let conn = self.connect()?;
        let deleted = conn
            .execute(
                "DELETE FROM records WHERE json_extract(metadata, '$.source') = ?1",
                params![source],
            )
            .map_err(|e| AppError::Store(format!("Failed to delete source '{}': {}", source, e)))?;

        tracing::info!("Deleted {} records for source '{}'", deleted, source);
        Ok(deleted)
    }

    /// Record the embedding settings on first use and reject different
    /// settings afterwards.
    pub fn ensure_embedding_config(&self, config: &EmbeddingConfig) -> AppResult<()> {
        let conn = self.connect()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'embedding'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::Store(format!("Failed to read store metadata: {}", e)))?;

        let identity = EmbeddingConfig {
            endpoint: None,
            ..config.clone()
        };

        match stored {
            Some(json) => {
                let existing: EmbeddingConfig = serde_json::from_str(&json)?;
                existing.validate_consistency(&identity)
            }
            None => {
                conn.execute(
                    "INSERT INTO store_meta (key, value) VALUES ('embedding', ?1)",
                    params![serde_json::to_string(&identity)?],
                )
                .map_err(|e| AppError::Store(format!("Failed to write store metadata: {}", e)))?;
                Ok(())
            }
        }
    }
}

/// An embedding provider bound to a vector store.
#[derive(Debug, Clone)]
pub struct EmbeddedSearch {
    provider: Arc<dyn EmbeddingProvider>,
    store: SqliteVectorStore,
}

impl EmbeddedSearch {
    /// Bind `provider` to `store`, checking the store was built with the
    /// same embedding settings.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: SqliteVectorStore) -> AppResult<Self> {
        store.ensure_embedding_config(&provider_identity(provider.as_ref()))?;
        Ok(Self { provider, store })
    }

    pub fn store(&self) -> &SqliteVectorStore {
        &self.store
    }

    /// Embed `(id, content, metadata)` triples and store them.
    pub async fn add_texts(&self, items: Vec<(String, String, Value)>) -> AppResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = items.iter().map(|(_, content, _)| content.clone()).collect();
        let embeddings = self.provider.embed_batch(&texts).await?;

        if embeddings.len() != items.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding count mismatch: {} texts, {} vectors",
                items.len(),
                embeddings.len()
            )));
        }

        let records: Vec<VectorRecord> = items
            .into_iter()
            .zip(embeddings)
            .map(|((id, content, metadata), embedding)| VectorRecord {
                id,
                content,
                metadata,
                embedding,
            })
            .collect();

        self.store.insert(&records)
    }
}

#[async_trait::async_trait]
impl SimilaritySearch for EmbeddedSearch {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: &Map<String, Value>,
    ) -> AppResult<Vec<VectorHit>> {
        let embedding = self.provider.embed(query).await?;
        self.store.search(&embedding, k, filter)
    }
}

fn provider_identity(provider: &dyn EmbeddingProvider) -> EmbeddingConfig {
    EmbeddingConfig {
        provider: provider.provider_name().to_string(),
        model: provider.model_name().to_string(),
        dimensions: provider.dimensions(),
        endpoint: None,
    }
}

fn json_to_sql(key: &str, value: &Value) -> AppResult<SqlValue> {
    match value {
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Integer(i)),
            None => Ok(SqlValue::Real(n.as_f64().unwrap_or(0.0))),
        },
        _ => Err(AppError::Store(format!(
            "Unsupported filter value for '{}': {}",
            key, value
        ))),
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Store(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(id: &str, source: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            content: format!("content {}", id),
            metadata: json!({"source": source, "id": id}),
            embedding,
        }
    }

    fn source_filter(source: &str) -> Map<String, Value> {
        let mut filter = Map::new();
        filter.insert("source".to_string(), json!(source));
        filter
    }

    #[test]
    fn test_insert_and_search() {
        let temp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(temp.path().join("v.sqlite")).unwrap();

        store
            .insert(&[
                record("a", "labor_law", vec![1.0, 0.0, 0.0]),
                record("b", "labor_law", vec![0.7, 0.7, 0.0]),
                record("c", "labor_law", vec![0.0, 0.0, 1.0]),
            ])
            .unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0], 2, &Map::new()).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "content a");
        assert!(hits[0].distance.abs() < 0.001);
        assert_eq!(hits[1].content, "content b");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn test_delete_source_keeps_other_tags() {
        let temp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(temp.path().join("v.sqlite")).unwrap();

        store
            .insert(&[
                record("a", "labor_law", vec![1.0, 0.0]),
                record("b", "qa", vec![0.0, 1.0]),
            ])
            .unwrap();

        assert_eq!(store.delete_source("labor_law").unwrap(), 1);
        assert_eq!(store.count().unwrap(), 1);
        assert!(store
            .search(&[1.0, 0.0], 5, &source_filter("labor_law"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_search_applies_metadata_filter() {
        let temp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(temp.path().join("v.sqlite")).unwrap();

        store
            .insert(&[
                record("law", "labor_law", vec![1.0, 0.0]),
                record("faq", "qa", vec![1.0, 0.0]),
            ])
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 5, &source_filter("qa")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["source"], "qa");

        let none = store.search(&[1.0, 0.0], 5, &source_filter("other")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let temp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(temp.path().join("v.sqlite")).unwrap();

        store.insert(&[record("a", "qa", vec![1.0])]).unwrap();
        store.insert(&[record("a", "qa", vec![1.0])]).unwrap();
        assert_eq!(store.count().unwrap(), 1);

        store.reset().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_embedding_config_mismatch_rejected() {
        let temp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(temp.path().join("v.sqlite")).unwrap();

        store
            .ensure_embedding_config(&EmbeddingConfig::default())
            .unwrap();
        store
            .ensure_embedding_config(&EmbeddingConfig::default())
            .unwrap();

        let other = EmbeddingConfig {
            dimensions: 768,
            ..Default::default()
        };
        assert!(store.ensure_embedding_config(&other).is_err());
    }

    #[tokio::test]
    async fn test_embedded_search_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = SqliteVectorStore::open(temp.path().join("v.sqlite")).unwrap();
        let search = EmbeddedSearch::new(Arc::new(TrigramProvider::new(384)), store).unwrap();

        search
            .add_texts(vec![
                (
                    "1".to_string(),
                    "雇主應依下列規定發給勞工資遣費".to_string(),
                    json!({"source": "labor_law"}),
                ),
                (
                    "2".to_string(),
                    "勞工每七日中應有二日之休息".to_string(),
                    json!({"source": "labor_law"}),
                ),
            ])
            .await
            .unwrap();

        let hits = search
            .search("資遣費如何計算", 1, &source_filter("labor_law"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].content.contains("資遣費"));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_invalid_embedding_bytes() {
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }
}
