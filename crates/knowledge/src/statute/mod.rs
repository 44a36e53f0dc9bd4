//! Statute text parsing.
//!
//! Turns the plain text of a statute into structured, cross-referenced
//! article records for the relational article store.

mod article;
mod numeral;
mod parser;

pub use article::{sort_key, ArticleNumber};
pub use numeral::chinese_to_int;
pub use parser::{extract_references, parse_statute, StatuteArticle};
