//! Embedding providers.
//!
//! Turns text into fixed-size vectors for the similarity store. The provider
//! is picked from configuration once and shared behind an `Arc`.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
