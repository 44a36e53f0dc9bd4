//! Grounded answer generation with bounded retries.

use super::render::{article_context, document_context, request_from_prompt};
use crate::config::RagConfig;
use crate::types::{DbArticle, GeneratedAnswer, RetrievedDocument};
use lawqa_core::{AppError, AppResult};
use lawqa_llm::{format_instructions, parse_structured, LlmClient, LlmRequest};
use lawqa_prompt::{build_prompt, load_prompt, ANSWER_PROMPT};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Attempt ceiling and backoff for structured generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff(),
        }
    }

    /// Delay after failed attempt `attempt` (1-based): doubles each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

/// Send `request` and parse the reply into `T`.
///
/// Only structured-output violations are retried. Once `max_attempts`
/// replies have been rejected the call fails with `AppError::Generation`.
/// Transport and provider errors are returned immediately.
pub async fn complete_structured<T: DeserializeOwned>(
    llm: &dyn LlmClient,
    request: &LlmRequest,
    policy: RetryPolicy,
) -> AppResult<T> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        tracing::debug!(attempt, max_attempts, "Requesting structured output");

        let response = llm.complete(request).await?;
        let error = match parse_structured::<T>(&response.content) {
            Ok(parsed) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Structured output accepted after retry");
                }
                return Ok(parsed);
            }
            Err(e) if e.is_output_parse() => e,
            Err(e) => return Err(e),
        };

        if attempt >= max_attempts {
            tracing::error!(attempts = attempt, error = %error, "Structured output retries exhausted");
            return Err(AppError::Generation {
                attempts: attempt,
                reason: error.to_string(),
            });
        }

        let delay = policy.backoff(attempt);
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Structured output rejected, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Synthesizes the final answer from both context blocks.
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmClient>,
    model: String,
    workspace: PathBuf,
    policy: RetryPolicy,
}

impl AnswerGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        workspace: PathBuf,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            workspace,
            policy,
        }
    }

    /// Generate `{answer, hit_references}`. Fails the request only when
    /// the prompt cannot be built, the provider errors, or every attempt
    /// produced malformed output.
    pub async fn generate(
        &self,
        question: &str,
        documents: &[RetrievedDocument],
        articles: &[DbArticle],
    ) -> AppResult<GeneratedAnswer> {
        let definition = load_prompt(&self.workspace, ANSWER_PROMPT)?;

        let mut variables = HashMap::new();
        variables.insert("documentContext".to_string(), document_context(documents));
        variables.insert("articleContext".to_string(), article_context(articles));
        variables.insert("question".to_string(), question.to_string());
        variables.insert("formatInstructions".to_string(), answer_format_instructions());

        let request = request_from_prompt(build_prompt(&definition, variables)?, &self.model);
        complete_structured(self.llm.as_ref(), &request, self.policy).await
    }
}

fn answer_format_instructions() -> String {
    format_instructions(&[
        ("answer", "string, the answer in Traditional Chinese"),
        (
            "hit_references",
            "array of the Source objects you relied on, copied exactly",
        ),
    ])
}
