//! RAG pipeline configuration management.
//!
//! Settings live in `.lawqa/rag.yaml`; every field has a default so the
//! file is optional.

use lawqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retrieval, generation and ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Similarity-search source tags, queried in this order
    pub sources: Vec<String>,

    /// Source tag given to embedded statute articles
    pub statute_source: String,

    /// Retrieval breadth when the caller does not pass one
    pub top_k: usize,

    /// Result cap for the keyword article search
    pub keyword_limit: usize,

    /// Attempt ceiling for structured generation
    pub max_attempts: u32,

    /// Delay before the first generation retry, doubled per retry
    pub initial_backoff_ms: u64,

    /// Document chunk size in characters
    pub chunk_size: usize,

    /// Overlap between document chunks in characters
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            sources: vec!["labor_law".to_string(), "qa".to_string()],
            statute_source: "labor_law".to_string(),
            top_k: crate::types::DEFAULT_TOP_K,
            keyword_limit: 3,
            max_attempts: 3,
            initial_backoff_ms: 500,
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl RagConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.sources.is_empty() {
            return Err(AppError::Config(
                "At least one retrieval source is required".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(AppError::Config(
                "max_attempts must be greater than zero".to_string(),
            ));
        }

        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "Invalid chunking: size {} overlap {}",
                self.chunk_size, self.chunk_overlap
            )));
        }

        Ok(())
    }
}

/// Load the RAG configuration of a workspace, falling back to defaults.
pub fn load_config(workspace: &Path) -> AppResult<RagConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("No rag.yaml found, using default RAG config");
        return Ok(RagConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: RagConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    config.validate()?;

    tracing::debug!("Loaded RAG config from {:?}", config_path);
    Ok(config)
}

/// Save the RAG configuration of a workspace.
pub fn save_config(workspace: &Path, config: &RagConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved RAG config to {:?}", config_path);
    Ok(())
}

/// Get the path to the RAG config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".lawqa").join("rag.yaml")
}

/// Get the directory holding the stores.
pub fn get_store_dir(workspace: &Path) -> PathBuf {
    workspace.join(".lawqa").join("store")
}

/// Get the SQLite vector store path.
pub fn get_vector_store_path(workspace: &Path) -> PathBuf {
    get_store_dir(workspace).join("vectors.sqlite")
}

/// Get the SQLite article store path.
pub fn get_article_store_path(workspace: &Path) -> PathBuf {
    get_store_dir(workspace).join("articles.sqlite")
}

/// Get the sources JSONL path.
pub fn get_sources_path(workspace: &Path) -> PathBuf {
    get_store_dir(workspace).join("sources.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();

        assert_eq!(config.sources, vec!["labor_law", "qa"]);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff(), Duration::from_millis(500));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = RagConfig {
            sources: vec!["qa".to_string()],
            chunk_size: 800,
            ..Default::default()
        };

        save_config(temp.path(), &config).unwrap();

        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".lawqa")).unwrap();
        std::fs::write(get_config_path(temp.path()), "keyword_limit: 7\n").unwrap();

        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded.keyword_limit, 7);
        assert_eq!(loaded.statute_source, "labor_law");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".lawqa")).unwrap();
        std::fs::write(get_config_path(temp.path()), "sources: []\n").unwrap();

        assert!(load_config(temp.path()).is_err());
    }

    #[test]
    fn test_store_paths() {
        let root = Path::new("/ws");
        assert_eq!(
            get_article_store_path(root),
            PathBuf::from("/ws/.lawqa/store/articles.sqlite")
        );
        assert!(get_sources_path(root).ends_with("sources.jsonl"));
    }
}
