//! Ollama embedding provider.
//!
//! Calls `/api/embeddings` once per text. Multilingual models such as
//! `bge-m3` or `nomic-embed-text` handle Traditional Chinese statute text.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use lawqa_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Attempts per text, including the first.
const MAX_ATTEMPTS: u32 = 3;

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Embeddings from a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaProvider {
    /// Build the provider and probe the server once.
    ///
    /// Fails with `AppError::Llm` when the server is unreachable or the
    /// model's vectors do not have the configured size.
    pub async fn new(config: EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.endpoint.as_deref().unwrap_or(DEFAULT_BASE_URL);

        let provider = Self {
            client,
            url: format!("{}/api/embeddings", base_url.trim_end_matches('/')),
            model: config.model,
            dimensions: config.dimensions,
        };

        provider.probe().await?;
        Ok(provider)
    }

    async fn probe(&self) -> AppResult<()> {
        tracing::debug!(url = %self.url, model = %self.model, "Probing Ollama embeddings");

        self.embed_with_retry("勞動基準法").await.map_err(|e| {
            AppError::Llm(format!(
                "Ollama embeddings unavailable at {} ({}). Is the server running and `ollama pull {}` done?",
                self.url, e, self.model
            ))
        })?;

        Ok(())
    }

    async fn embed_with_retry(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut attempt = 1;
        loop {
            match self.request(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    let delay = backoff(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Embedding request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request(&self, text: &str) -> AppResult<Vec<f32>> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status,
                error_message(&body)
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Invalid embedding response: {}", e)))?;

        check_dimensions(&body.embedding, self.dimensions)?;
        Ok(body.embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Blank texts map to the zero vector without a request.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            if text.trim().is_empty() {
                embeddings.push(vec![0.0; self.dimensions]);
            } else {
                embeddings.push(self.embed_with_retry(text).await?);
            }
        }

        tracing::debug!(count = embeddings.len(), model = %self.model, "Embedded batch");
        Ok(embeddings)
    }
}

fn backoff(attempt: u32) -> Duration {
    INITIAL_BACKOFF * 2u32.pow(attempt.saturating_sub(1))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.to_string())
}

fn check_dimensions(embedding: &[f32], expected: usize) -> AppResult<()> {
    if embedding.len() != expected {
        return Err(AppError::Llm(format!(
            "Embedding has {} dimensions, expected {}",
            embedding.len(),
            expected
        )));
    }
    Ok(())
}
