//! Error types for the labor law QA system.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, LLM, stores, prompts and the
//! structured-output contract of the answer generator.

use thiserror::Error;

/// Unified error type for the labor law QA system.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors (transport, HTTP status, empty responses)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base, ingestion and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Vector or relational store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Model output did not satisfy the requested JSON schema
    #[error("Output parse error: {0}")]
    OutputParse(String),

    /// Answer generation gave up after the attempt ceiling
    #[error("Generation failed after {attempts} attempt(s): {reason}")]
    Generation { attempts: u32, reason: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error is a structured-output contract violation.
    pub fn is_output_parse(&self) -> bool {
        matches!(self, AppError::OutputParse(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
