//! Configuration management.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config files (.lawqa/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with all state stored in `.lawqa/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Default Ollama endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Completion providers the LLM factory can build.
pub const KNOWN_PROVIDERS: [&str; 1] = ["ollama"];

/// Embedding providers the embedding factory can build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "trigram"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .lawqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider (e.g., "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Provider endpoint override
    pub endpoint: Option<String>,

    /// Embedding provider ("ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimension
    pub embedding_dimensions: usize,

    /// Log level override
    pub log_level: Option<String>,

    /// Log output format
    #[serde(skip)]
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider", default = "default_embedding_provider")]
    pub active_embedding_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: Option<String>,

    pub model: Option<String>,

    #[serde(rename = "embeddingModel")]
    pub embedding_model: Option<String>,

    #[serde(rename = "embeddingDimensions")]
    pub embedding_dimensions: Option<usize>,

    /// Request timeout in seconds
    pub timeout: Option<u64>,
}

fn default_embedding_provider() -> String {
    "ollama".to_string()
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    format: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dimensions: 768,
            log_level: None,
            log_format: LogFormat::Pretty,
            verbose: false,
            no_color: false,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the workspace config file and environment.
    ///
    /// Environment variables:
    /// - `LAWQA_WORKSPACE`: Override workspace path
    /// - `LAWQA_CONFIG`: Path to config file
    /// - `LAWQA_PROVIDER`: Completion provider
    /// - `LAWQA_MODEL`: Completion model
    /// - `LAWQA_ENDPOINT`: Provider endpoint
    /// - `LAWQA_EMBEDDING_PROVIDER`: Embedding provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// `Some` values take precedence over `LAWQA_WORKSPACE` and
    /// `LAWQA_CONFIG`, so the YAML file is read from the final location.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace = workspace.or_else(|| env_path("LAWQA_WORKSPACE"));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("LAWQA_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".lawqa/config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("LAWQA_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("LAWQA_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("LAWQA_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Ok(embedding_provider) = std::env::var("LAWQA_EMBEDDING_PROVIDER") {
            config.embedding_provider = embedding_provider;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(format) = logging.format {
                result.log_format = LogFormat::parse(&format).ok_or_else(|| {
                    AppError::Config(format!("Unknown log format in {:?}: {}", path, format))
                })?;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            result.embedding_provider = llm.active_embedding_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                if let Some(ref model) = provider_config.model {
                    result.model = model.clone();
                }
                if provider_config.endpoint.is_some() {
                    result.endpoint = provider_config.endpoint.clone();
                }
            }

            if let Some(embedding_config) = llm.providers.get(&llm.active_embedding_provider) {
                if let Some(ref model) = embedding_config.embedding_model {
                    result.embedding_model = model.clone();
                }
                if let Some(dimensions) = embedding_config.embedding_dimensions {
                    result.embedding_dimensions = dimensions;
                }
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        log_format: Option<LogFormat>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if let Some(log_format) = log_format {
            self.log_format = log_format;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .lawqa directory.
    pub fn lawqa_dir(&self) -> PathBuf {
        self.workspace.join(".lawqa")
    }

    /// Ensure the .lawqa directory exists.
    pub fn ensure_lawqa_dir(&self) -> AppResult<()> {
        let dir = self.lawqa_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .lawqa directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolve the endpoint of a provider, falling back to the Ollama default.
    pub fn resolve_endpoint(&self, provider: &str) -> String {
        if provider == self.provider {
            if let Some(ref endpoint) = self.endpoint {
                return endpoint.clone();
            }
        }

        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
            .and_then(|pc| pc.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Resolve the request timeout of a provider in seconds.
    pub fn resolve_timeout(&self, provider: &str) -> Option<u64> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
            .and_then(|pc| pc.timeout)
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding_dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.embedding_dimensions, 768);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_lawqa_dir() {
        let config = AppConfig::default();
        assert!(config.lawqa_dir().ends_with(".lawqa"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("qwen2.5".to_string()),
            None,
            Some(LogFormat::Json),
            true,
            false,
        );

        assert_eq!(overridden.model, "qwen2.5");
        assert_eq!(overridden.log_format, LogFormat::Json);
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  activeEmbeddingProvider: trigram
  providers:
    ollama:
      endpoint: http://gpu-box:11434
      model: qwen2.5:14b
      timeout: 120
    trigram:
      embeddingModel: trigram-v1
      embeddingDimensions: 384
logging:
  level: warn
  format: json
  color: false
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.model, "qwen2.5:14b");
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.embedding_provider, "trigram");
        assert_eq!(config.embedding_model, "trigram-v1");
        assert_eq!(config.embedding_dimensions, 384);
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.no_color);
        assert_eq!(config.resolve_timeout("ollama"), Some(120));
    }

    #[test]
    fn test_load_from_explicit_workspace_reads_its_yaml() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".lawqa");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "llm:\n  activeProvider: ollama\n  activeEmbeddingProvider: trigram\n  providers:\n    ollama:\n      model: qwen2.5:7b\n",
        )
        .unwrap();

        let config = AppConfig::load_from(
            Some(temp.path().to_path_buf()),
            Some(dir.join("config.yaml")),
        )
        .unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.embedding_provider, "trigram");
    }

    #[test]
    fn test_load_from_missing_workspace_fails() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_from(Some(temp.path().join("nope")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_endpoint_default() {
        let config = AppConfig::default();
        assert_eq!(config.resolve_endpoint("ollama"), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_embedding_provider() {
        let mut config = AppConfig::default();
        config.embedding_provider = "word2vec".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
