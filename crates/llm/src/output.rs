//! Structured output parsing.
//!
//! Models are asked to answer with a single JSON object. They frequently wrap
//! it in Markdown fences or surround it with prose, so the parser locates the
//! outermost object before deserializing it into the requested type. Anything
//! that still fails is reported as `AppError::OutputParse`, which callers may
//! retry.

use lawqa_core::{AppError, AppResult};
use serde::de::DeserializeOwned;

/// Describe the expected JSON object for inclusion in a prompt.
///
/// `fields` are `(key, description)` pairs in the order they should be listed.
pub fn format_instructions(fields: &[(&str, &str)]) -> String {
    let mut out = String::from(
        "Respond with exactly one JSON object and nothing else. \
         Do not wrap it in Markdown. The object must contain these keys:\n",
    );

    for (key, description) in fields {
        out.push_str(&format!("- \"{}\": {}\n", key, description));
    }

    out
}

/// Parse model output into `T`.
///
/// Accepts bare JSON, fenced JSON (```json ... ```), and JSON embedded in
/// surrounding text.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> AppResult<T> {
    let candidate = extract_json_object(text).ok_or_else(|| {
        AppError::OutputParse(format!(
            "no JSON object found in model output: {}",
            preview(text)
        ))
    })?;

    let value: serde_json::Value = serde_json::from_str(candidate)
        .map_err(|e| AppError::OutputParse(format!("invalid JSON: {}", e)))?;

    serde_json::from_value(value)
        .map_err(|e| AppError::OutputParse(format!("schema mismatch: {}", e)))
}

/// Locate the outermost `{ ... }` span in `text`.
fn extract_json_object(text: &str) -> Option<&str> {
    let trimmed = strip_fences(text.trim());
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&trimmed[start..=end])
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 80;
    let mut out: String = text.chars().take(MAX_CHARS).collect();
    if text.chars().count() > MAX_CHARS {
        out.push_str("...");
    }
    out
}
