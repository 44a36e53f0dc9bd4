//! Retrieval-augmented question answering over the labor-law corpus.

pub mod consult;
pub mod extractor;
pub mod generator;
pub mod pipeline;
pub mod reconciler;
pub mod render;
pub mod retriever;
pub mod search;

pub use consult::consult;
pub use extractor::ArticleExtractor;
pub use generator::{complete_structured, AnswerGenerator, RetryPolicy};
pub use pipeline::{PipelineState, RagPipeline};
pub use reconciler::{reconcile, ReferenceReconciler};
pub use retriever::DocumentRetriever;
pub use search::RelationalArticleSearch;
