//! Question answering pipeline.
//!
//! `Retrieve -> Extract -> SearchDB -> Generate -> Reconcile`. Every stage
//! takes the request state by value and hands back the next one; nothing
//! outside the state is mutated.

use super::extractor::ArticleExtractor;
use super::generator::{AnswerGenerator, RetryPolicy};
use super::reconciler::reconcile;
use super::retriever::DocumentRetriever;
use super::search::RelationalArticleSearch;
use crate::context::RagContext;
use crate::statute::ArticleNumber;
use crate::types::{DbArticle, FinalResult, GeneratedAnswer, Question, Reference, RetrievedDocument};
use lawqa_core::{AppError, AppResult};
use std::collections::BTreeSet;
use tracing::Instrument;

/// Per-request data threaded through the stages.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub question: Question,
    pub documents: Vec<RetrievedDocument>,
    pub article_numbers: BTreeSet<ArticleNumber>,
    pub db_articles: Vec<DbArticle>,
}

impl PipelineState {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            documents: Vec::new(),
            article_numbers: BTreeSet::new(),
            db_articles: Vec::new(),
        }
    }

    /// Every candidate reference: retrieved documents, then store articles.
    pub fn candidates(&self) -> Vec<Reference> {
        self.documents
            .iter()
            .map(Reference::from)
            .chain(self.db_articles.iter().map(Reference::from))
            .collect()
    }
}

/// The assembled stages.
#[derive(Clone)]
pub struct RagPipeline {
    retriever: DocumentRetriever,
    extractor: ArticleExtractor,
    search: RelationalArticleSearch,
    generator: AnswerGenerator,
}

impl RagPipeline {
    pub fn new(
        retriever: DocumentRetriever,
        extractor: ArticleExtractor,
        search: RelationalArticleSearch,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            retriever,
            extractor,
            search,
            generator,
        }
    }

    /// Wire every stage to the shared context.
    pub fn from_context(ctx: &RagContext) -> Self {
        Self::new(
            DocumentRetriever::new(ctx.vectors.clone(), ctx.config.sources.clone()),
            ArticleExtractor::new(ctx.llm.clone(), ctx.model.clone(), ctx.workspace.clone()),
            RelationalArticleSearch::new(ctx.articles.clone(), ctx.config.keyword_limit),
            AnswerGenerator::new(
                ctx.llm.clone(),
                ctx.model.clone(),
                ctx.workspace.clone(),
                RetryPolicy::from_config(&ctx.config),
            ),
        )
    }

    /// Answer one question. Fails only when generation fails.
    pub async fn run(&self, question: Question) -> AppResult<FinalResult> {
        tracing::info!(question = %question.text(), top_k = question.top_k(), "Answering question");

        let state = PipelineState::new(question);
        let state = self.retrieve(state).await;
        let state = self.extract(state).await;
        let state = self.search_db(state).await;
        let (state, generated) = self.generate(state).await?;

        Ok(self.reconcile(state, generated))
    }

    async fn retrieve(&self, mut state: PipelineState) -> PipelineState {
        async {
            state.documents = self.retriever.retrieve(&state.question).await;
            tracing::info!(documents = state.documents.len(), "Retrieved documents");
            state
        }
        .instrument(tracing::info_span!("stage", name = "retrieve"))
        .await
    }

    async fn extract(&self, mut state: PipelineState) -> PipelineState {
        async {
            state.article_numbers = self
                .extractor
                .extract(state.question.text(), &state.documents)
                .await;
            tracing::info!(
                articles = ?state.article_numbers.iter().map(ArticleNumber::as_str).collect::<Vec<_>>(),
                "Extracted article numbers"
            );
            state
        }
        .instrument(tracing::info_span!("stage", name = "extract"))
        .await
    }

    async fn search_db(&self, mut state: PipelineState) -> PipelineState {
        async {
            let numbers: Vec<ArticleNumber> = state.article_numbers.iter().cloned().collect();
            state.db_articles = self
                .search
                .search_combined(state.question.text(), &numbers);
            tracing::info!(articles = state.db_articles.len(), "Fetched store articles");
            state
        }
        .instrument(tracing::info_span!("stage", name = "search_db"))
        .await
    }

    async fn generate(&self, state: PipelineState) -> AppResult<(PipelineState, GeneratedAnswer)> {
        async {
            let generated = self
                .generator
                .generate(state.question.text(), &state.documents, &state.db_articles)
                .await?;
            tracing::info!(
                hit_references = generated.hit_references.len(),
                "Generated answer"
            );
            Ok::<_, AppError>((state, generated))
        }
        .instrument(tracing::info_span!("stage", name = "generate"))
        .await
    }

    fn reconcile(&self, state: PipelineState, generated: GeneratedAnswer) -> FinalResult {
        let _span = tracing::info_span!("stage", name = "reconcile").entered();

        let references = state.candidates();
        let hit_references = reconcile(&generated.hit_references, &references);

        FinalResult {
            question: state.question.text().to_string(),
            answer: generated.answer,
            hit_references,
            references,
        }
    }
}
