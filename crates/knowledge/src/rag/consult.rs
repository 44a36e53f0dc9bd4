//! Whole-statute consultation.

use super::generator::{complete_structured, RetryPolicy};
use super::render::request_from_prompt;
use crate::context::RagContext;
use crate::types::ConsultResult;
use lawqa_core::{AppError, AppResult};
use lawqa_llm::format_instructions;
use lawqa_prompt::{build_prompt, load_prompt, CONSULT_PROMPT};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct ConsultAnswer {
    answer: String,
}

/// Answer `question` with the complete statute text as the only context.
///
/// Malformed replies are retried under the same policy as grounded answers.
pub async fn consult(ctx: &RagContext, question: &str, law_text: &str) -> AppResult<ConsultResult> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Other("Question cannot be empty".to_string()));
    }

    tracing::info!(
        law_chars = law_text.chars().count(),
        "Consulting full statute text"
    );

    let definition = load_prompt(&ctx.workspace, CONSULT_PROMPT)?;

    let mut variables = HashMap::new();
    variables.insert("lawText".to_string(), law_text.to_string());
    variables.insert("question".to_string(), question.to_string());
    variables.insert(
        "formatInstructions".to_string(),
        format_instructions(&[("answer", "string, the answer in Traditional Chinese")]),
    );

    let request = request_from_prompt(build_prompt(&definition, variables)?, &ctx.model);
    let parsed: ConsultAnswer = complete_structured(
        ctx.llm.as_ref(),
        &request,
        RetryPolicy::from_config(&ctx.config),
    )
    .await?;

    Ok(ConsultResult {
        question: question.to_string(),
        answer: parsed.answer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagConfig;
    use crate::embeddings::providers::TrigramProvider;
    use crate::tests::ScriptedLlm;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(temp: &TempDir, llm: Arc<ScriptedLlm>) -> RagContext {
        let config = RagConfig {
            initial_backoff_ms: 0,
            ..RagConfig::default()
        };
        RagContext::new(
            temp.path().to_path_buf(),
            llm,
            "test-model",
            Arc::new(TrigramProvider::new(384)),
            config,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_consult_sends_law_text_and_returns_answer() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new([r#"{"answer": "每年七日"}"#]));
        let ctx = context(&temp, llm.clone());

        let result = consult(&ctx, " 特休幾天 ", "第 38 條\n特別休假。")
            .await
            .unwrap();

        assert_eq!(result.question, "特休幾天");
        assert_eq!(result.answer, "每年七日");
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("第 38 條"));
        assert!(prompt.contains("問題: 特休幾天"));
    }

    #[tokio::test]
    async fn test_consult_retries_malformed_reply() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(["不是 JSON", r#"{"answer": "可以"}"#]));
        let ctx = context(&temp, llm.clone());

        let result = consult(&ctx, "可以加班嗎", "法條").await.unwrap();
        assert_eq!(result.answer, "可以");
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_consult_rejects_blank_question() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(Vec::<String>::new()));
        let ctx = context(&temp, llm.clone());

        assert!(consult(&ctx, "  ", "法條").await.is_err());
        assert_eq!(llm.calls(), 0);
    }
}
