//! Article numbers such as `17` and `17-1`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// An article identifier: `<main>` or `<main>-<sub>`.
///
/// Ordering is numeric on `(main, sub)`, so `"9" < "10" < "10-1" < "11"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleNumber(String);

impl ArticleNumber {
    /// Wrap a raw article number without validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse a well-formed article number (`^\d+(-\d+)?$`), trimming whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let well_formed = match value.split_once('-') {
            Some((main, sub)) => is_digits(main) && is_digits(sub),
            None => is_digits(value),
        };
        well_formed.then(|| Self(value.to_string()))
    }

    /// Build `<main>` or `<main>-<sub>`.
    pub fn from_parts(main: u32, sub: Option<u32>) -> Self {
        match sub {
            Some(sub) => Self(format!("{}-{}", main, sub)),
            None => Self(main.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn sort_key(&self) -> (u32, u32) {
        sort_key(&self.0)
    }
}

/// Numeric sort key `(main, sub)` for an article number string.
///
/// A missing sub-number is 0. Non-numeric parts also map to 0.
pub fn sort_key(value: &str) -> (u32, u32) {
    let value = value.trim();
    let (main, sub) = value.split_once('-').unwrap_or((value, "0"));
    (main.parse().unwrap_or(0), sub.parse().unwrap_or(0))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl Ord for ArticleNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ArticleNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ArticleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
