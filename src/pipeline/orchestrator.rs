use super::context::PipelineContext;
use super::phase_trait::WorkflowPhase;
use super::phases::{IndexPhase, MaterializePhase, TidyPhase};
use crate::kb::{IndexReport, MaterializeReport};
use crate::ledger::TidyReport;
use crate::progress::ProgressEvent;
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Instant;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Tidy,
    Materialize,
    Index,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Tidy, Stage::Materialize, Stage::Index];

    fn phase(self) -> Box<dyn WorkflowPhase> {
        match self {
            Stage::Tidy => Box::new(TidyPhase),
            Stage::Materialize => Box::new(MaterializePhase),
            Stage::Index => Box::new(IndexPhase),
        }
    }
}

/// What a pipeline run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<Stage>,
    pub tidy: Option<TidyReport>,
    pub materialize: Option<MaterializeReport>,
    pub index: Option<IndexReport>,
    pub total_time_ms: u64,
}

pub struct PipelineOrchestrator {
    stages: Vec<Stage>,
}

impl PipelineOrchestrator {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Tidy, materialize and index
    pub fn full() -> Self {
        Self::new(Stage::ALL.to_vec())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub async fn execute(&self, context: &mut PipelineContext) -> Result<PipelineReport> {
        let start = Instant::now();
        let root = context.layout.root().display().to_string();
        context
            .progress
            .on_progress(&ProgressEvent::Started { root });

        let workflow_phases: Vec<Box<dyn WorkflowPhase>> =
            self.stages.iter().map(|stage| stage.phase()).collect();

        for phase in workflow_phases {
            let phase_name = phase.name();
            context.progress.on_progress(&ProgressEvent::PhaseStarted {
                phase: phase_name.to_string(),
            });

            let phase_start = Instant::now();
            if let Err(err) = phase.execute(context).await {
                context.progress.on_progress(&ProgressEvent::Failed {
                    phase: phase_name.to_string(),
                    error: format!("{:#}", err),
                });
                return Err(err).with_context(|| format!("Phase {} failed", phase_name));
            }

            context.progress.on_progress(&ProgressEvent::PhaseComplete {
                phase: phase_name.to_string(),
                duration: phase_start.elapsed(),
            });
        }

        let total_time = start.elapsed();
        context.progress.on_progress(&ProgressEvent::Completed {
            phases: self.stages.len(),
            total_time,
        });

        Ok(PipelineReport {
            stages: self.stages.clone(),
            tidy: context.tidy.clone(),
            materialize: context.materialize.clone(),
            index: context.index.clone(),
            total_time_ms: total_time.as_millis() as u64,
        })
    }
}
