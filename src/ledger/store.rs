//! Reading and writing tidy record files

use super::record::LedgerRecord;
use super::LedgerError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const TIDY_SUFFIX: &str = "_tidy.csv";

/// Outcome of merging tidy files into the processed dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub files: usize,
    pub rows: usize,
    pub dataset: Option<PathBuf>,
}

/// Writes records as a tidy CSV, creating parent directories
pub fn write_records(path: &Path, records: &[LedgerRecord]) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| LedgerError::csv(path, e))?;
    if records.is_empty() {
        writer
            .write_record(["Year", "Month", "Type", "Source", "Amount"])
            .map_err(|e| LedgerError::csv(path, e))?;
    }
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| LedgerError::csv(path, e))?;
    }
    writer.flush().map_err(|e| LedgerError::io(path, e))?;
    Ok(())
}

/// Reads a tidy CSV or the processed dataset
pub fn read_records(path: &Path) -> Result<Vec<LedgerRecord>, LedgerError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| LedgerError::csv(path, e))?;
    reader
        .deserialize::<LedgerRecord>()
        .map(|row| row.map_err(|e| LedgerError::csv(path, e)))
        .collect()
}

/// Tidy files in `dir`, sorted by path
pub fn list_tidy_files(dir: &Path) -> Result<Vec<PathBuf>, LedgerError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LedgerError::io(dir, e))? {
        let path = entry.map_err(|e| LedgerError::io(dir, e))?.path();
        let is_tidy = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TIDY_SUFFIX));
        if is_tidy && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Concatenates every tidy file in `tidy_dir` into `dataset`
///
/// Writes nothing when there are no tidy files.
pub fn merge_tidy(tidy_dir: &Path, dataset: &Path) -> Result<MergeReport, LedgerError> {
    let files = list_tidy_files(tidy_dir)?;
    if files.is_empty() {
        warn!("No tidy CSVs to merge in {}", tidy_dir.display());
        return Ok(MergeReport::default());
    }

    let mut merged = Vec::new();
    for file in &files {
        merged.extend(read_records(file)?);
    }

    write_records(dataset, &merged)?;
    info!(
        "Merged {} tidy files into {} ({} rows)",
        files.len(),
        dataset.display(),
        merged.len()
    );

    Ok(MergeReport {
        files: files.len(),
        rows: merged.len(),
        dataset: Some(dataset.to_path_buf()),
    })
}
