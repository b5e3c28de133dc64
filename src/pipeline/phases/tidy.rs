use crate::ledger::run_tidy;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Converts raw exports into tidy files and the merged dataset
pub struct TidyPhase;

#[async_trait]
impl WorkflowPhase for TidyPhase {
    fn name(&self) -> &'static str {
        "TidyPhase"
    }

    async fn execute(&self, context: &mut PipelineContext) -> Result<()> {
        let report = run_tidy(&context.layout, context.progress.as_ref())
            .context("Failed to tidy raw exports")?;

        info!(
            "Tidied {} of {} files; dataset has {} rows",
            report.converted(),
            report.files.len(),
            report.merge.rows
        );
        context.tidy = Some(report);
        Ok(())
    }
}
