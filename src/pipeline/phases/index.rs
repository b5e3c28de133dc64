use crate::kb::build_index;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Chunks and embeds `kb/raw` into `kb/index`
pub struct IndexPhase;

#[async_trait]
impl WorkflowPhase for IndexPhase {
    fn name(&self) -> &'static str {
        "IndexPhase"
    }

    async fn execute(&self, context: &mut PipelineContext) -> Result<()> {
        let embedder = context.embedder().await?;
        let layout = context.layout.clone();
        let options = context.chunking();
        let batch_size = context.config.embed_batch_size;
        let progress = context.progress.clone();

        let report = tokio::task::spawn_blocking(move || {
            build_index(
                &layout,
                embedder.as_ref(),
                options,
                batch_size,
                progress.as_ref(),
            )
        })
        .await
        .context("Index build task failed")?
        .context("Failed to build the vector index")?;

        context.index = Some(report);
        Ok(())
    }
}
