//! Process-wide resources shared by every request.

use crate::config::{self, RagConfig};
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::store::{EmbeddedSearch, SqliteArticleStore, SqliteVectorStore};
use lawqa_core::{AppConfig, AppResult};
use lawqa_llm::{create_client, LlmClient};
use std::path::PathBuf;
use std::sync::Arc;

/// Clients, stores and settings built once at startup.
///
/// Read-only after construction; cheap to clone and safe to share across
/// concurrently running pipelines.
#[derive(Clone)]
pub struct RagContext {
    pub workspace: PathBuf,
    pub llm: Arc<dyn LlmClient>,
    pub model: String,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub vectors: Arc<EmbeddedSearch>,
    pub articles: SqliteArticleStore,
    pub config: RagConfig,
}

impl RagContext {
    /// Build a context from already-created clients, opening the stores
    /// under the workspace's `.lawqa/store/`.
    pub fn new(
        workspace: PathBuf,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RagConfig,
    ) -> AppResult<Self> {
        config.validate()?;

        let vector_store = SqliteVectorStore::open(config::get_vector_store_path(&workspace))?;
        let vectors = Arc::new(EmbeddedSearch::new(embedder.clone(), vector_store)?);
        let articles = SqliteArticleStore::open(config::get_article_store_path(&workspace))?;

        Ok(Self {
            workspace,
            llm,
            model: model.into(),
            embedder,
            vectors,
            articles,
            config,
        })
    }

    /// Build a context from application configuration.
    pub async fn from_app_config(app: &AppConfig) -> AppResult<Self> {
        let endpoint = app.resolve_endpoint(&app.provider);
        let llm = create_client(
            &app.provider,
            Some(&endpoint),
            app.resolve_timeout(&app.provider),
        )?;

        let embedding_config = EmbeddingConfig::from_app_config(app);
        tracing::debug!(
            provider = %embedding_config.provider,
            model = %embedding_config.model,
            dimensions = embedding_config.dimensions,
            "Creating embedding provider"
        );
        let embedder = create_provider(&embedding_config).await?;

        let rag_config = config::load_config(&app.workspace)?;

        Self::new(
            app.workspace.clone(),
            llm,
            app.model.clone(),
            embedder,
            rag_config,
        )
    }
}

impl std::fmt::Debug for RagContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagContext")
            .field("workspace", &self.workspace)
            .field("provider", &self.llm.provider_name())
            .field("model", &self.model)
            .field("embedder", &self.embedder)
            .field("config", &self.config)
            .finish()
    }
}
