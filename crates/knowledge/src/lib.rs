//! Labor-law knowledge base and question answering.
//!
//! Statute text is parsed into numbered articles and stored twice: as rows
//! in a relational article store and as embeddings in a vector store.
//! Questions are answered by [`RagPipeline`], which combines both stores
//! with a language model and reconciles the citations it returns.

pub mod chunker;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod ingest;
pub mod rag;
pub mod reader;
pub mod sources;
pub mod statute;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::RagConfig;
pub use context::RagContext;
pub use ingest::{ingest_documents, ingest_statute};
pub use rag::{consult, RagPipeline};
pub use sources::SourceLedger;
pub use statute::{parse_statute, ArticleNumber, StatuteArticle};
pub use types::{
    ConsultResult, FinalResult, IngestStats, KnowledgeSource, Question, ReconciledHit, Reference,
};

use lawqa_core::AppResult;

/// Answer one question with a pipeline wired to `ctx`.
pub async fn ask(ctx: &RagContext, text: &str, top_k: usize) -> AppResult<FinalResult> {
    let question = Question::new(text, top_k)?;
    RagPipeline::from_context(ctx).run(question).await
}
