//! Ingestion of statute text and supporting documents.

use crate::chunker;
use crate::context::RagContext;
use crate::reader;
use crate::sources::SourceLedger;
use crate::statute::{parse_statute, StatuteArticle};
use crate::types::{IngestStats, KnowledgeSource};
use chrono::Utc;
use lawqa_core::{AppError, AppResult};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

/// Parse a statute file into the article store and embed every article
/// under the configured statute source tag.
///
/// A file that yields no articles aborts the run before any store is
/// touched.
pub async fn ingest_statute(ctx: &RagContext, path: &Path, reset: bool) -> AppResult<IngestStats> {
    let start = Instant::now();
    let tag = ctx.config.statute_source.clone();

    tracing::info!("Ingesting statute {:?} as '{}'", path, tag);

    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    let articles = parse_statute(&text);
    if articles.is_empty() {
        return Err(AppError::Knowledge(format!(
            "no articles found in {:?}",
            path
        )));
    }

    if reset {
        tracing::info!("Resetting article store and '{}' vectors", tag);
        ctx.articles.reset()?;
        ctx.vectors.store().delete_source(&tag)?;
    }

    let stored = ctx.articles.insert_articles(&articles, &tag)?;

    let items = articles
        .iter()
        .map(|article| article_record(article, &tag))
        .collect();
    let embedded = ctx.vectors.add_texts(items).await?;

    let source_id = uuid::Uuid::new_v4().to_string();
    let bytes_processed = text.len() as u64;

    SourceLedger::new(&ctx.workspace).record(&KnowledgeSource {
        source_id: source_id.clone(),
        path: path.display().to_string(),
        source_tag: tag,
        kind: "statute".to_string(),
        indexed_at: Utc::now(),
        record_count: stored as u32,
        byte_count: bytes_processed,
    })?;

    let duration = start.elapsed();
    tracing::info!(
        "Statute ingestion completed: {} articles, {} embedded in {:.2}s",
        stored,
        embedded,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        source_id,
        articles: stored as u32,
        embedded: embedded as u32,
        bytes_processed,
        duration_secs: duration.as_secs_f64(),
    })
}

/// Chunk and embed every readable file under `dir` with the given source tag.
pub async fn ingest_documents(
    ctx: &RagContext,
    dir: &Path,
    source_tag: &str,
    reset: bool,
) -> AppResult<IngestStats> {
    let start = Instant::now();

    if !dir.is_dir() {
        return Err(AppError::Knowledge(format!("Not a directory: {:?}", dir)));
    }

    tracing::info!("Ingesting documents from {:?} as '{}'", dir, source_tag);

    if reset {
        ctx.vectors.store().delete_source(source_tag)?;
    }

    let mut embedded = 0usize;
    let mut bytes_processed = 0u64;

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || is_hidden(path) {
            continue;
        }

        let text = match reader::read_document(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        let relative = path.strip_prefix(dir).unwrap_or(path).display().to_string();
        let items: Vec<(String, String, Value)> =
            chunker::chunk_text(&text, ctx.config.chunk_size, ctx.config.chunk_overlap)
                .into_iter()
                .map(|chunk| {
                    (
                        format!("{}:{}:{}", source_tag, relative, chunk.position),
                        chunk.text,
                        json!({
                            "source": source_tag,
                            "path": relative,
                            "position": chunk.position,
                        }),
                    )
                })
                .collect();

        tracing::debug!("Embedding {} chunks from {:?}", items.len(), path);
        embedded += ctx.vectors.add_texts(items).await?;
        bytes_processed += text.len() as u64;
    }

    if embedded == 0 {
        tracing::warn!("No document chunks found under {:?}", dir);
    }

    let source_id = uuid::Uuid::new_v4().to_string();
    SourceLedger::new(&ctx.workspace).record(&KnowledgeSource {
        source_id: source_id.clone(),
        path: dir.display().to_string(),
        source_tag: source_tag.to_string(),
        kind: "documents".to_string(),
        indexed_at: Utc::now(),
        record_count: embedded as u32,
        byte_count: bytes_processed,
    })?;

    let duration = start.elapsed();
    tracing::info!(
        "Document ingestion completed: {} chunks, {} bytes in {:.2}s",
        embedded,
        bytes_processed,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        source_id,
        articles: 0,
        embedded: embedded as u32,
        bytes_processed,
        duration_secs: duration.as_secs_f64(),
    })
}

fn article_record(article: &StatuteArticle, tag: &str) -> (String, String, Value) {
    (
        format!("{}:article:{}", tag, article.article),
        article.text.clone(),
        json!({
            "source": tag,
            "chapter": article.chapter,
            "article": article.article,
        }),
    )
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
