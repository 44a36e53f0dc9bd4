//! Context rendering and request assembly shared by the LLM stages.

use crate::types::{DbArticle, RetrievedDocument};
use lawqa_llm::LlmRequest;
use lawqa_prompt::BuiltPrompt;
use serde_json::Value;

/// Render one `source metadata + content` pair.
pub fn render_block(metadata: &Value, content: &str) -> String {
    format!("Source:\n{}\n\nContent:\n{}", metadata, content)
}

/// Render retrieved documents, separated by blank lines.
pub fn document_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|doc| render_block(&doc.metadata, &doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render store articles, separated by blank lines.
pub fn article_context(articles: &[DbArticle]) -> String {
    articles
        .iter()
        .map(|article| render_block(&article.metadata, &article.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Turn a rendered prompt into a completion request for `model`.
pub fn request_from_prompt(prompt: BuiltPrompt, model: &str) -> LlmRequest {
    let json_output = prompt.metadata.json_output;
    let mut request = LlmRequest::new(prompt.user, model).with_temperature(0.2);

    if let Some(system) = prompt.system {
        request = request.with_system(system);
    }

    if json_output {
        request = request.with_json_output();
    }

    request
}
