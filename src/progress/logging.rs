//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { root } => {
                info!(root = %root, "Starting pipeline");
            }
            ProgressEvent::PhaseStarted { phase } => {
                info!(phase = %phase, "Phase started");
            }
            ProgressEvent::FileProcessed { path, records } => {
                debug!(file = %path, records, "File processed");
            }
            ProgressEvent::FileSkipped { path, reason } => {
                warn!(file = %path, reason = %reason, "File skipped");
            }
            ProgressEvent::EmbeddingBatch { done, total } => {
                debug!(done, total, "Embedded batch");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                info!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::Completed { phases, total_time } => {
                info!(
                    phases,
                    total_time_ms = total_time.as_millis(),
                    "Pipeline complete"
                );
            }
            ProgressEvent::Failed { phase, error } => {
                error!(phase = %phase, error = %error, "Pipeline failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_logging_handler_accepts_every_event() {
        let handler = LoggingHandler;
        let events = vec![
            ProgressEvent::Started {
                root: ".".to_string(),
            },
            ProgressEvent::PhaseStarted {
                phase: "index".to_string(),
            },
            ProgressEvent::FileSkipped {
                path: "scan.pdf".to_string(),
                reason: "no text".to_string(),
            },
            ProgressEvent::EmbeddingBatch { done: 64, total: 100 },
            ProgressEvent::Completed {
                phases: 3,
                total_time: Duration::from_secs(1),
            },
            ProgressEvent::Failed {
                phase: "tidy".to_string(),
                error: "boom".to_string(),
            },
        ];

        for event in &events {
            handler.on_progress(event);
        }
    }
}
