//! Advisory extraction of statute article numbers.

use super::render::{document_context, request_from_prompt};
use crate::statute::ArticleNumber;
use crate::types::{ExtractionResult, RetrievedDocument};
use lawqa_core::AppResult;
use lawqa_llm::{format_instructions, parse_structured, LlmClient};
use lawqa_prompt::{build_prompt, load_prompt, EXTRACT_PROMPT};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Asks the model which articles are worth fetching directly.
///
/// The answer is a hint. Any failure yields an empty set.
#[derive(Clone)]
pub struct ArticleExtractor {
    llm: Arc<dyn LlmClient>,
    model: String,
    workspace: PathBuf,
}

impl ArticleExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, workspace: PathBuf) -> Self {
        Self {
            llm,
            model: model.into(),
            workspace,
        }
    }

    pub async fn extract(
        &self,
        question: &str,
        documents: &[RetrievedDocument],
    ) -> BTreeSet<ArticleNumber> {
        match self.try_extract(question, documents).await {
            Ok(numbers) => numbers,
            Err(e) => {
                tracing::warn!(error = %e, "Article extraction failed, continuing without hints");
                BTreeSet::new()
            }
        }
    }

    async fn try_extract(
        &self,
        question: &str,
        documents: &[RetrievedDocument],
    ) -> AppResult<BTreeSet<ArticleNumber>> {
        let definition = load_prompt(&self.workspace, EXTRACT_PROMPT)?;

        let mut variables = HashMap::new();
        variables.insert("documentContext".to_string(), document_context(documents));
        variables.insert("question".to_string(), question.to_string());
        variables.insert(
            "formatInstructions".to_string(),
            format_instructions(&[(
                "article_numbers",
                "array of article number strings such as \"17\" or \"17-1\"",
            )]),
        );

        let request = request_from_prompt(build_prompt(&definition, variables)?, &self.model);
        let response = self.llm.complete(&request).await?;
        let result: ExtractionResult = parse_structured(&response.content)?;

        Ok(normalize_numbers(&result.article_numbers))
    }
}

/// Keep well-formed article numbers, sorted and de-duplicated.
pub fn normalize_numbers(raw: &[String]) -> BTreeSet<ArticleNumber> {
    let mut numbers = BTreeSet::new();

    for value in raw {
        match ArticleNumber::parse(value) {
            Some(number) => {
                numbers.insert(number);
            }
            None => tracing::debug!(value = %value, "Dropping malformed article number"),
        }
    }

    numbers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ScriptedLlm;
    use tempfile::TempDir;

    fn numbers(set: &BTreeSet<ArticleNumber>) -> Vec<&str> {
        set.iter().map(|n| n.as_str()).collect()
    }

    #[tokio::test]
    async fn test_extracts_and_sorts_numbers() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new([
            r#"{"article_numbers": ["17-1", "17", "11", "17"]}"#,
        ]));
        let extractor = ArticleExtractor::new(llm.clone(), "test", temp.path().to_path_buf());

        let found = extractor.extract("資遣費如何計算", &[]).await;
        assert_eq!(numbers(&found), vec!["11", "17", "17-1"]);
        assert_eq!(llm.calls(), 1);
        assert!(llm.last_prompt().unwrap().contains("資遣費如何計算"));
    }

    #[tokio::test]
    async fn test_malformed_output_yields_empty_set() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(["第十七條"]));
        let extractor = ArticleExtractor::new(llm.clone(), "test", temp.path().to_path_buf());

        assert!(extractor.extract("q", &[]).await.is_empty());
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_reply_without_numbers_key_is_parse_failure() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(["{}", "{}"]));
        let extractor = ArticleExtractor::new(llm.clone(), "test", temp.path().to_path_buf());

        let err = extractor.try_extract("q", &[]).await.unwrap_err();
        assert!(err.is_output_parse());
        assert!(extractor.extract("q", &[]).await.is_empty());
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_model_failure_yields_empty_set() {
        let temp = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new(Vec::<String>::new()));
        let extractor = ArticleExtractor::new(llm, "test", temp.path().to_path_buf());

        assert!(extractor.extract("q", &[]).await.is_empty());
    }

    #[test]
    fn test_normalize_drops_malformed() {
        let raw = vec![
            "17".to_string(),
            " 9 ".to_string(),
            "第十七條".to_string(),
            "17-1-1".to_string(),
        ];
        assert_eq!(numbers(&normalize_numbers(&raw)), vec!["9", "17"]);
    }
}
