use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{AppPaths, Settings};
use crate::embed::{Embedder, HttpEmbedder};
use crate::feedback::{FeedbackService, FeedbackStore};
use crate::llm::{Generator, OpenAiGenerator};
use crate::retrieval::{EngineConfig, PromptBuilder, RetrievalEngine};

pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub engine: RetrievalEngine,
    pub feedback: FeedbackService,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Option<Arc<dyn Generator>>,
    pub prompt_builder: PromptBuilder,
}

impl AppState {
    /// Build every long-lived component and replay the feedback log into a
    /// fresh index. The server must not accept requests before this returns.
    pub async fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths)?;
        let timeout = Duration::from_secs(settings.request_timeout_secs);

        let engine = RetrievalEngine::new(
            settings.embedding_dim,
            EngineConfig::from_settings(&settings),
        );

        let store = FeedbackStore::open(paths.db_path.clone()).await?;
        let feedback = FeedbackService::new(store);
        let restored = feedback.rebuild(&engine).await?;
        tracing::info!("Restored {} feedback entries into the index", restored);

        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(
            &settings.embedding_base_url,
            &settings.embedding_model,
            settings.embedding_dim,
            timeout,
        )?);

        let generator: Option<Arc<dyn Generator>> = match settings.openai_api_key.as_deref() {
            Some(key) => Some(Arc::new(OpenAiGenerator::new(
                &settings.generation_base_url,
                key,
                &settings.generation_model,
                timeout,
            )?)),
            None => {
                tracing::info!("No generation credential configured; running in placeholder mode");
                None
            }
        };

        let prompt_builder = PromptBuilder::new(settings.role_weights);

        Ok(Arc::new(AppState {
            paths,
            settings,
            engine,
            feedback,
            embedder,
            generator,
            prompt_builder,
        }))
    }
}
