use super::ScriptedLlm;
use crate::config::RagConfig;
use crate::context::RagContext;
use crate::embeddings::providers::TrigramProvider;
use crate::ingest::{ingest_documents, ingest_statute};
use crate::rag::RagPipeline;
use crate::types::{Question, ReconciledHit};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

const STATUTE: &str = "\
第 一 章 總則
第 1 條
為規定勞動條件最低標準，保障勞工權益，特制定本法。
第 二 章 勞動契約
第 11 條
非有左列情事之一者，雇主不得預告勞工終止勞動契約。
第 17 條
雇主依前條終止勞動契約者，應依下列規定發給勞工資遣費。
第 17-1 條
要派單位違反規定者，應依第十七條規定發給資遣費。
";

const FAQ: &str = "問：公司歇業，資遣費如何計算？\n答：依勞動基準法規定計算資遣費。";

async fn setup(temp: &TempDir, llm: Arc<ScriptedLlm>) -> RagContext {
    let config = RagConfig {
        initial_backoff_ms: 0,
        ..RagConfig::default()
    };
    let ctx = RagContext::new(
        temp.path().to_path_buf(),
        llm,
        "test-model",
        Arc::new(TrigramProvider::new(384)),
        config,
    )
    .unwrap();

    let statute = temp.path().join("labor_law.txt");
    std::fs::write(&statute, STATUTE).unwrap();
    ingest_statute(&ctx, &statute, false).await.unwrap();

    let qa = temp.path().join("qa");
    std::fs::create_dir_all(&qa).unwrap();
    std::fs::write(qa.join("severance.txt"), FAQ).unwrap();
    ingest_documents(&ctx, &qa, "qa", false).await.unwrap();

    ctx
}

#[tokio::test]
async fn test_question_answered_with_both_retrieval_paths() {
    let temp = TempDir::new().unwrap();
    let answer = json!({
        "answer": "應依第17-1條計算資遣費。",
        "hit_references": [
            {"metadata": {"source": "labor_law", "references": ["17"], "article": "17-1", "chapter": 2}},
            {"article": "99"}
        ]
    });
    let llm = Arc::new(ScriptedLlm::new([
        r#"{"article_numbers": ["17"]}"#.to_string(),
        answer.to_string(),
    ]));
    let ctx = setup(&temp, llm.clone()).await;

    let result = RagPipeline::from_context(&ctx)
        .run(Question::new("資遣費如何計算", 3).unwrap())
        .await
        .unwrap();

    assert_eq!(llm.calls(), 2);
    assert_eq!(result.question, "資遣費如何計算");
    assert!(!result.answer.is_empty());

    // Three statute documents, one Q&A document, then the article citing 17.
    let scored = result.references.iter().filter(|r| r.score.is_some()).count();
    let unscored: Vec<&str> = result
        .references
        .iter()
        .filter(|r| r.score.is_none())
        .map(|r| r.metadata["article"].as_str().unwrap())
        .collect();
    assert_eq!(scored, 4);
    assert_eq!(unscored, vec!["17-1"]);
    assert!(result
        .references
        .iter()
        .any(|r| r.metadata["source"] == "qa"));

    assert_eq!(result.hit_references.len(), 2);
    match &result.hit_references[0] {
        ReconciledHit::Verified(reference) => {
            assert_eq!(reference.metadata["article"], "17-1");
            assert!(reference.page_content.contains("資遣費"));
            assert!(reference.score.is_none());
        }
        other => panic!("expected verified hit, got {:?}", other),
    }
    assert_eq!(
        result.hit_references[1],
        ReconciledHit::Unverified(json!({"article": "99"}))
    );
}

#[tokio::test]
async fn test_failed_extraction_still_answers() {
    let temp = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLlm::new([
        "沒有條號".to_string(),
        r#"{"answer": "請參考相關規定。", "hit_references": []}"#.to_string(),
    ]));
    let ctx = setup(&temp, llm.clone()).await;

    let result = crate::ask(&ctx, "資遣費如何計算", 3).await.unwrap();

    assert_eq!(llm.calls(), 2);
    assert_eq!(result.answer, "請參考相關規定。");
    assert!(result.hit_references.is_empty());
    assert!(result.references.iter().all(|r| r.score.is_some()));
}

#[tokio::test]
async fn test_generation_exhaustion_fails_request() {
    let temp = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLlm::repeating("not json"));
    let ctx = setup(&temp, llm.clone()).await;

    let result = crate::ask(&ctx, "資遣費如何計算", 3).await;

    assert!(matches!(
        result,
        Err(lawqa_core::AppError::Generation { attempts: 3, .. })
    ));
    // One extraction call plus three generation attempts.
    assert_eq!(llm.calls(), 4);
}

#[tokio::test]
async fn test_concurrent_pipelines_share_context() {
    let temp = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLlm::repeating(
        r#"{"article_numbers": [], "answer": "ok", "hit_references": []}"#,
    ));
    let ctx = setup(&temp, llm.clone()).await;

    let first = crate::ask(&ctx, "資遣費如何計算", 2);
    let second = crate::ask(&ctx, "勞動契約終止", 2);
    let (a, b) = tokio::join!(first, second);

    assert_eq!(a.unwrap().answer, "ok");
    assert_eq!(b.unwrap().answer, "ok");
    assert_eq!(llm.calls(), 4);
}
