//! Stage orchestration: tidy, materialize, index

pub mod context;
pub mod orchestrator;
pub mod phase_trait;
pub mod phases;

pub use context::PipelineContext;
pub use orchestrator::{PipelineOrchestrator, PipelineReport, Stage};
pub use phase_trait::WorkflowPhase;
pub use phases::{IndexPhase, MaterializePhase, TidyPhase};
