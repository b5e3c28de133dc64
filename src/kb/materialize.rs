//! Writes per-year fact sheets and per-category narratives into `kb/raw`

use super::summary::{category_summary, expense_by_source, year_summary};
use super::KnowledgeBaseError;
use crate::config::ProjectLayout;
use crate::ledger::{read_records, LedgerRecord};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary of a materialize run
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterializeReport {
    pub years: Vec<i32>,
    pub categories: Vec<String>,
    pub documents: Vec<PathBuf>,
    pub skipped_rows: usize,
}

/// File-system-safe name: alphanumerics and `-_.` survive, everything else
/// becomes `_`
pub fn safe_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Loads the processed dataset, dropping rows that carry no year
pub fn load_dataset(path: &Path) -> Result<(Vec<LedgerRecord>, usize), KnowledgeBaseError> {
    if !path.exists() {
        return Err(KnowledgeBaseError::DatasetMissing(path.to_path_buf()));
    }

    let all = read_records(path)?;
    let total = all.len();
    let dated: Vec<LedgerRecord> = all.into_iter().filter(|r| r.year.is_some()).collect();
    let skipped = total - dated.len();
    if skipped > 0 {
        warn!(
            skipped,
            "Ignoring dataset rows without a year in {}",
            path.display()
        );
    }
    Ok((dated, skipped))
}

fn write_markdown(path: &Path, text: &str) -> Result<(), KnowledgeBaseError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| KnowledgeBaseError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| KnowledgeBaseError::io(path, e))
}

/// Renders the knowledge-base documents for the processed dataset
///
/// `top_categories` bounds how many expense sources get a narrative, largest
/// lifetime spend first.
pub fn materialize(
    layout: &ProjectLayout,
    top_categories: usize,
) -> Result<MaterializeReport, KnowledgeBaseError> {
    let (records, skipped_rows) = load_dataset(&layout.dataset_file())?;
    let mut report = MaterializeReport {
        skipped_rows,
        ..Default::default()
    };

    let years: BTreeSet<i32> = records.iter().filter_map(|r| r.year).collect();
    for year in years {
        let path = layout.facts_dir().join(format!("{}.md", year));
        write_markdown(&path, &year_summary(&records, year))?;
        report.years.push(year);
        report.documents.push(path);
    }

    for (source, _) in expense_by_source(records.iter())
        .into_iter()
        .take(top_categories)
    {
        let path = layout
            .categories_dir()
            .join(format!("{}.md", safe_file_stem(&source)));
        write_markdown(&path, &category_summary(&records, &source))?;
        report.categories.push(source);
        report.documents.push(path);
    }

    info!(
        "Wrote {} year summaries and {} category narratives into {}",
        report.years.len(),
        report.categories.len(),
        layout.kb_raw_dir().display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::write_records;
    use tempfile::TempDir;

    fn rec(year: Option<i32>, month: u32, kind: &str, source: &str, amount: f64) -> LedgerRecord {
        LedgerRecord {
            year,
            month,
            kind: Some(kind.to_string()),
            source: Some(source.to_string()),
            amount,
        }
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Food & Dining"), "Food___Dining");
        assert_eq!(safe_file_stem("car-loan_v2.1"), "car-loan_v2.1");
        assert_eq!(safe_file_stem("Café/Bar"), "Café_Bar");
    }

    #[test]
    fn test_missing_dataset_is_reported() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());

        let err = materialize(&layout, 30).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::DatasetMissing(_)));
    }

    #[test]
    fn test_materialize_writes_facts_and_top_categories() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        write_records(
            &layout.dataset_file(),
            &[
                rec(Some(2020), 1, "Income", "Salary", 3000.0),
                rec(Some(2020), 1, "Expense", "Rent", 1000.0),
                rec(Some(2021), 1, "Expense", "Kids & School", 400.0),
                rec(Some(2021), 2, "Expense", "Gym", 40.0),
                rec(None, 3, "Expense", "Rent", 1000.0),
            ],
        )
        .unwrap();

        let report = materialize(&layout, 2).unwrap();

        assert_eq!(report.years, vec![2020, 2021]);
        assert_eq!(report.categories, vec!["Rent", "Kids & School"]);
        assert_eq!(report.skipped_rows, 1);
        assert!(layout.facts_dir().join("2020.md").exists());
        assert!(layout.facts_dir().join("2021.md").exists());
        assert!(layout.categories_dir().join("Rent.md").exists());
        assert!(layout.categories_dir().join("Kids___School.md").exists());
        assert!(!layout.categories_dir().join("Gym.md").exists());

        let rent = fs::read_to_string(layout.categories_dir().join("Rent.md")).unwrap();
        assert!(rent.starts_with("# Category: Rent\n- Lifetime expense total: 1,000.00\n"));
    }
}
