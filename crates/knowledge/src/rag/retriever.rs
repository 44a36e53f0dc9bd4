//! Semantic retrieval across tagged sources.

use crate::store::SimilaritySearch;
use crate::types::{Question, RetrievedDocument};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Queries each configured source tag and concatenates the results.
#[derive(Clone)]
pub struct DocumentRetriever {
    search: Arc<dyn SimilaritySearch>,
    sources: Vec<String>,
}

impl DocumentRetriever {
    pub fn new(search: Arc<dyn SimilaritySearch>, sources: Vec<String>) -> Self {
        Self { search, sources }
    }

    /// Run one query per source, each bounded by the question's `top_k`.
    ///
    /// Results keep source declaration order and per-source rank. Duplicate
    /// content across sources is kept. A failing source is logged and
    /// contributes nothing.
    pub async fn retrieve(&self, question: &Question) -> Vec<RetrievedDocument> {
        let mut documents = Vec::new();

        for source in &self.sources {
            let mut filter = Map::new();
            filter.insert("source".to_string(), Value::String(source.clone()));

            match self
                .search
                .search(question.text(), question.top_k(), &filter)
                .await
            {
                Ok(hits) => {
                    tracing::debug!(source = %source, hits = hits.len(), "Similarity search done");
                    documents.extend(hits.into_iter().map(|hit| RetrievedDocument {
                        content: hit.content,
                        metadata: hit.metadata,
                        relevance: relevance(hit.distance),
                    }));
                }
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "Similarity search failed, skipping source");
                }
            }
        }

        documents
    }
}

/// Invert a distance into a relevance score in `[0, 1]`.
pub fn relevance(distance: f32) -> f32 {
    if distance.is_nan() {
        return 0.0;
    }
    (1.0 - distance).clamp(0.0, 1.0)
}
