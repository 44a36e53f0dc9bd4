//! Keyword and citation-number lookups over the article store.
//!
//! Store failures never reach the caller: they are logged and the lookup
//! yields nothing.

use crate::statute::ArticleNumber;
use crate::store::SqliteArticleStore;
use crate::types::DbArticle;
use std::collections::HashSet;

/// Coarse-recall search over statute articles.
#[derive(Debug, Clone)]
pub struct RelationalArticleSearch {
    store: SqliteArticleStore,
    keyword_limit: usize,
}

impl RelationalArticleSearch {
    pub fn new(store: SqliteArticleStore, keyword_limit: usize) -> Self {
        Self {
            store,
            keyword_limit,
        }
    }

    /// Articles whose text contains the raw question.
    pub fn search(&self, question: &str) -> Vec<DbArticle> {
        match self.store.keyword_search(question, self.keyword_limit) {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(error = %e, "Keyword article search failed");
                Vec::new()
            }
        }
    }

    /// Articles citing any of `numbers`.
    pub fn search_by_numbers(&self, numbers: &[ArticleNumber]) -> Vec<DbArticle> {
        if numbers.is_empty() {
            return Vec::new();
        }

        match self.store.search_by_numbers(numbers) {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(error = %e, "Article number search failed");
                Vec::new()
            }
        }
    }

    /// Keyword results followed by number results, de-duplicated by content.
    pub fn search_combined(&self, question: &str, numbers: &[ArticleNumber]) -> Vec<DbArticle> {
        let keyword = self.search(question);
        let by_number = self.search_by_numbers(numbers);

        tracing::debug!(
            keyword = keyword.len(),
            by_number = by_number.len(),
            "Article lookups done"
        );

        merge_unique(keyword, by_number)
    }
}

/// Concatenate `first` and `second`, keeping the first occurrence of each
/// distinct content.
pub fn merge_unique(first: Vec<DbArticle>, second: Vec<DbArticle>) -> Vec<DbArticle> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|article| seen.insert(article.content.clone()))
        .collect()
}
