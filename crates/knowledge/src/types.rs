//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use lawqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Smallest accepted retrieval breadth.
pub const MIN_TOP_K: usize = 1;

/// Largest accepted retrieval breadth.
pub const MAX_TOP_K: usize = 10;

/// Retrieval breadth used when the caller does not pick one.
pub const DEFAULT_TOP_K: usize = 5;

/// A user question and its retrieval breadth.
///
/// `top_k` is clamped to `[MIN_TOP_K, MAX_TOP_K]` on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    top_k: usize,
}

impl Question {
    pub fn new(text: impl Into<String>, top_k: usize) -> AppResult<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(AppError::Other("Question cannot be empty".to_string()));
        }

        let clamped = top_k.clamp(MIN_TOP_K, MAX_TOP_K);
        if clamped != top_k {
            tracing::warn!(requested = top_k, used = clamped, "top_k out of range, clamped");
        }

        Ok(Self {
            text,
            top_k: clamped,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

/// A passage returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    pub metadata: serde_json::Value,

    /// Similarity normalized to `[0, 1]`, 1.0 being most relevant.
    pub relevance: f32,
}

/// A statute article as returned by the relational article store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbArticle {
    pub content: String,
    pub metadata: serde_json::Value,
}

/// Raw output of the article extraction prompt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionResult {
    pub article_numbers: Vec<String>,
}

/// Raw output of the answer prompt, before reconciliation.
///
/// `hit_references` echo whatever the model cited and may be partial or
/// invented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub hit_references: Vec<serde_json::Value>,
}

/// A fully-hydrated candidate reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub page_content: String,
    pub metadata: serde_json::Value,

    /// Relevance for retrieved documents; absent for store articles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl From<&RetrievedDocument> for Reference {
    fn from(doc: &RetrievedDocument) -> Self {
        Self {
            page_content: doc.content.clone(),
            metadata: doc.metadata.clone(),
            score: Some(doc.relevance),
        }
    }
}

impl From<&DbArticle> for Reference {
    fn from(article: &DbArticle) -> Self {
        Self {
            page_content: article.content.clone(),
            metadata: article.metadata.clone(),
            score: None,
        }
    }
}

/// A model-cited reference after reconciliation.
///
/// Both variants serialize to the bare object, so an unmatched hit is
/// emitted exactly as the model produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReconciledHit {
    /// Matched a candidate; carries the candidate with its full content.
    Verified(Reference),

    /// Matched nothing; passed through verbatim.
    Unverified(serde_json::Value),
}

impl ReconciledHit {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// The answer returned to callers of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct FinalResult {
    pub question: String,
    pub answer: String,
    pub hit_references: Vec<ReconciledHit>,

    /// Every candidate: retrieved documents first, then store articles.
    pub references: Vec<Reference>,
}

/// Answer produced from the complete statute text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultResult {
    pub question: String,
    pub answer: String,
}

/// One ingestion run recorded in sources.jsonl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSource {
    /// Unique source identifier
    pub source_id: String,

    /// File or directory that was ingested
    pub path: String,

    /// Retrieval source tag the records were stored under
    pub source_tag: String,

    /// "statute" or "documents"
    pub kind: String,

    /// When this source was ingested
    pub indexed_at: DateTime<Utc>,

    /// Number of records written
    pub record_count: u32,

    /// Source size in bytes
    pub byte_count: u64,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    pub source_id: String,

    /// Articles written to the article store (statute runs only)
    pub articles: u32,

    /// Records embedded into the vector store
    pub embedded: u32,

    pub bytes_processed: u64,

    pub duration_secs: f64,
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub position: u32,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_clamps_top_k() {
        assert_eq!(Question::new("q", 0).unwrap().top_k(), 1);
        assert_eq!(Question::new("q", 3).unwrap().top_k(), 3);
        assert_eq!(Question::new("q", 50).unwrap().top_k(), 10);
    }

    #[test]
    fn test_question_rejects_blank_text() {
        assert!(Question::new("   ", 5).is_err());
        assert_eq!(Question::new(" 特休 ", 5).unwrap().text(), "特休");
    }

    #[test]
    fn test_unverified_hit_serializes_verbatim() {
        let raw = serde_json::json!({"metadata": {"article": "99"}, "note": "x"});
        let hit = ReconciledHit::Unverified(raw.clone());
        assert_eq!(serde_json::to_value(&hit).unwrap(), raw);
        assert!(!hit.is_verified());
    }

    #[test]
    fn test_verified_hit_serializes_as_reference() {
        let hit = ReconciledHit::Verified(Reference {
            page_content: "雇主應發給資遣費".to_string(),
            metadata: serde_json::json!({"article": "17"}),
            score: None,
        });
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["page_content"], "雇主應發給資遣費");
        assert!(value.get("score").is_none());
    }

    #[test]
    fn test_generated_answer_requires_both_keys() {
        assert!(serde_json::from_str::<GeneratedAnswer>(r#"{"answer":"ok"}"#).is_err());

        let parsed: GeneratedAnswer =
            serde_json::from_str(r#"{"answer":"ok","hit_references":[]}"#).unwrap();
        assert!(parsed.hit_references.is_empty());
    }
}
