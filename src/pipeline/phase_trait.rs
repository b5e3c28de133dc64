use super::context::PipelineContext;
use anyhow::Result;
use async_trait::async_trait;

/// One stage of the data pipeline
#[async_trait]
pub trait WorkflowPhase: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, context: &mut PipelineContext) -> Result<()>;
}
