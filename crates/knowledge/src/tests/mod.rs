//! Cross-module scenario tests and shared test doubles.

mod generation_retry;
mod pipeline_e2e;
mod support;

pub use support::ScriptedLlm;
