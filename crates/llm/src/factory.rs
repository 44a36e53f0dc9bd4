//! LLM provider factory.
//!
//! Creates LLM clients from the configured provider name. Clients are built
//! once at startup and shared behind an `Arc`.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use lawqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `timeout_secs` - Optional request timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, or `AppError::Llm`
/// if the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    timeout_secs: Option<u64>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = match timeout_secs {
                Some(secs) => OllamaClient::with_timeout(base_url, secs)?,
                None => OllamaClient::with_base_url(base_url),
            };
            tracing::debug!("Created Ollama client at {}", base_url);
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}
