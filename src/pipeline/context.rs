//! Shared state threaded through the pipeline phases

use crate::config::{FinsightConfig, ProjectLayout};
use crate::embedding::{create_embedder, Embedder};
use crate::kb::{ChunkingOptions, IndexReport, MaterializeReport};
use crate::ledger::TidyReport;
use crate::progress::{NoOpHandler, ProgressHandler};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

pub struct PipelineContext {
    pub config: FinsightConfig,
    pub layout: ProjectLayout,
    pub progress: Arc<dyn ProgressHandler>,

    /// Created on first use so that stages without embeddings stay offline
    embedder: Option<Arc<dyn Embedder>>,

    pub tidy: Option<TidyReport>,
    pub materialize: Option<MaterializeReport>,
    pub index: Option<IndexReport>,
}

impl PipelineContext {
    pub fn new(config: FinsightConfig) -> Self {
        let layout = config.layout();
        Self {
            config,
            layout,
            progress: Arc::new(NoOpHandler),
            embedder: None,
            tidy: None,
            materialize: None,
            index: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// Uses `embedder` instead of building one from the configuration
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Returns the embedder, loading the configured one on first call
    pub async fn embedder(&mut self) -> Result<Arc<dyn Embedder>> {
        if let Some(embedder) = &self.embedder {
            return Ok(embedder.clone());
        }

        debug!("Loading {} embedder", self.config.embedder);
        let config = self.config.clone();
        let embedder = tokio::task::spawn_blocking(move || create_embedder(&config))
            .await
            .context("Embedder loading task failed")?
            .with_context(|| format!("Failed to load {} embedder", self.config.embedder))?;

        self.embedder = Some(embedder.clone());
        Ok(embedder)
    }

    pub fn chunking(&self) -> ChunkingOptions {
        ChunkingOptions {
            max_chars: self.config.chunk_size,
            overlap: self.config.chunk_overlap,
        }
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("root", &self.layout.root())
            .field("embedder_loaded", &self.embedder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbedderKind;
    use crate::embedding::HashingEmbedder;

    #[tokio::test]
    async fn test_embedder_is_created_lazily() {
        let config = FinsightConfig {
            embedder: EmbedderKind::Hashing,
            ..Default::default()
        };
        let mut context = PipelineContext::new(config);
        assert!(!context.has_embedder());

        let embedder = context.embedder().await.unwrap();
        assert_eq!(embedder.model_id(), "hashing-384");
        assert!(context.has_embedder());
    }

    #[tokio::test]
    async fn test_injected_embedder_is_used() {
        let mut context = PipelineContext::new(FinsightConfig::default())
            .with_embedder(Arc::new(HashingEmbedder::new(8)));

        assert_eq!(context.embedder().await.unwrap().dimension(), 8);
    }

    #[test]
    fn test_chunking_follows_config() {
        let config = FinsightConfig {
            chunk_size: 500,
            chunk_overlap: 50,
            ..Default::default()
        };
        let options = PipelineContext::new(config).chunking();
        assert_eq!(options.max_chars, 500);
        assert_eq!(options.overlap, 50);
    }
}
