use super::ScriptedLlm;
use crate::rag::generator::{AnswerGenerator, RetryPolicy};
use lawqa_core::AppError;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const VALID: &str = r#"{"answer": "依第17條發給資遣費", "hit_references": []}"#;

fn generator(llm: Arc<ScriptedLlm>, temp: &TempDir) -> AnswerGenerator {
    AnswerGenerator::new(
        llm,
        "test-model",
        temp.path().to_path_buf(),
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
        },
    )
}

#[tokio::test]
async fn test_two_failures_then_success_uses_three_calls() {
    let temp = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLlm::new(["抱歉", r#"{"answer": 1}"#, VALID]));

    let answer = generator(llm.clone(), &temp)
        .generate("資遣費如何計算", &[], &[])
        .await
        .unwrap();

    assert_eq!(answer.answer, "依第17條發給資遣費");
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn test_persistent_failure_stops_at_ceiling() {
    let temp = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLlm::repeating("I cannot answer."));

    let err = generator(llm.clone(), &temp)
        .generate("資遣費如何計算", &[], &[])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Generation { attempts: 3, .. }));
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn test_backoff_waits_between_attempts() {
    let temp = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLlm::new(["x", "y", VALID]));
    let generator = AnswerGenerator::new(
        llm.clone(),
        "test-model",
        temp.path().to_path_buf(),
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
        },
    );

    let start = std::time::Instant::now();
    generator.generate("q", &[], &[]).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(30));
    assert_eq!(llm.calls(), 3);
}
