use crate::kb::materialize;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::progress::ProgressEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Renders year and category documents from the processed dataset
pub struct MaterializePhase;

#[async_trait]
impl WorkflowPhase for MaterializePhase {
    fn name(&self) -> &'static str {
        "MaterializePhase"
    }

    async fn execute(&self, context: &mut PipelineContext) -> Result<()> {
        let report = materialize(&context.layout, context.config.top_categories)
            .context("Failed to materialize knowledge-base documents")?;

        for document in &report.documents {
            context.progress.on_progress(&ProgressEvent::FileProcessed {
                path: document.display().to_string(),
                records: 1,
            });
        }
        context.materialize = Some(report);
        Ok(())
    }
}
