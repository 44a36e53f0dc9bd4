//! Embedding configuration.

use lawqa_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding settings shared by ingestion and retrieval.
///
/// A store records the settings it was built with; querying it with
/// different settings is rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Provider endpoint, for network providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Derive embedding settings from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let provider = config.embedding_provider.clone();

        if provider == "trigram" {
            return Self {
                dimensions: config.embedding_dimensions,
                ..Default::default()
            };
        }

        Self {
            endpoint: Some(config.resolve_endpoint(&provider)),
            provider,
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
        }
    }

    /// Validate that another config is consistent with this one.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::Knowledge(format!(
                "Provider mismatch: expected '{}', got '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::Knowledge(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Knowledge(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}
