//! Tidy stage: raw monthly exports to long-form ledger records
//!
//! Reads `data/raw/*.csv`, writes one `data/tidy/<stem>_tidy.csv` per input and
//! merges them into `data/processed/all_years_data.csv`.

pub mod amount;
pub mod period;
pub mod record;
pub mod reshape;
pub mod store;

pub use amount::parse_amount;
pub use period::{is_month_header, parse_period_label, year_from_filename};
pub use record::{split_category, LedgerRecord, EXPENSE, INCOME};
pub use reshape::{process_csv, reshape_csv, select_value_columns, ReshapeOutcome};
pub use store::{list_tidy_files, merge_tidy, read_records, write_records, MergeReport};

use crate::config::ProjectLayout;
use crate::progress::{ProgressEvent, ProgressHandler};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors raised while converting or merging ledger files
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Raw directory not found: {0}")]
    RawDirMissing(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LedgerError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        LedgerError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Per-file result of the tidy stage
#[derive(Debug, Clone, Serialize)]
pub struct TidyFileReport {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub records: usize,
    pub skipped: Option<String>,
}

/// Summary of a tidy run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TidyReport {
    pub files: Vec<TidyFileReport>,
    pub merge: MergeReport,
}

impl TidyReport {
    pub fn converted(&self) -> usize {
        self.files.iter().filter(|f| f.output.is_some()).count()
    }
}

fn raw_csv_files(raw_dir: &Path) -> Result<Vec<PathBuf>, LedgerError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(raw_dir).map_err(|e| LedgerError::io(raw_dir, e))? {
        let path = entry.map_err(|e| LedgerError::io(raw_dir, e))?.path();
        let is_csv = path.extension().and_then(|e| e.to_str()) == Some("csv");
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Converts every raw export and merges the results
pub fn run_tidy(
    layout: &ProjectLayout,
    progress: &dyn ProgressHandler,
) -> Result<TidyReport, LedgerError> {
    let raw_dir = layout.raw_dir();
    let tidy_dir = layout.tidy_dir();
    let processed_dir = layout.processed_dir();

    fs::create_dir_all(&tidy_dir).map_err(|e| LedgerError::io(&tidy_dir, e))?;
    fs::create_dir_all(&processed_dir).map_err(|e| LedgerError::io(&processed_dir, e))?;

    if !raw_dir.is_dir() {
        return Err(LedgerError::RawDirMissing(raw_dir));
    }

    let inputs = raw_csv_files(&raw_dir)?;
    if inputs.is_empty() {
        warn!("No CSV files found in {}", raw_dir.display());
        return Ok(TidyReport::default());
    }

    let mut report = TidyReport::default();
    for input in inputs {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("export");
        let output = tidy_dir.join(format!("{}_tidy.csv", stem));

        match process_csv(&input, &output)? {
            ReshapeOutcome::Written { output, records } => {
                progress.on_progress(&ProgressEvent::FileProcessed {
                    path: input.display().to_string(),
                    records,
                });
                report.files.push(TidyFileReport {
                    input,
                    output: Some(output),
                    records,
                    skipped: None,
                });
            }
            ReshapeOutcome::Skipped { reason } => {
                progress.on_progress(&ProgressEvent::FileSkipped {
                    path: input.display().to_string(),
                    reason: reason.clone(),
                });
                report.files.push(TidyFileReport {
                    input,
                    output: None,
                    records: 0,
                    skipped: Some(reason),
                });
            }
        }
    }

    report.merge = merge_tidy(&tidy_dir, &layout.dataset_file())?;
    Ok(report)
}
