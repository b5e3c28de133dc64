//! Wide-to-long conversion of raw monthly exports
//!
//! A raw export has one row per category and one column per month:
//!
//! ```text
//! Category,Jan,Feb,Mar,Total
//! Income - Salary,"5,000","5,000","5,200","15,200"
//! Expense - Rent,(1200),1200,1200,3600
//! ```
//!
//! Each (row, month column) pair becomes one [`LedgerRecord`].

use super::amount::parse_amount;
use super::period::{is_month_header, parse_period_label, year_from_filename};
use super::record::{split_category, LedgerRecord};
use super::store::write_records;
use super::LedgerError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NON_MONTH_HEADERS: &[&str] = &["total", "totals", "grand total"];

/// Result of converting a single raw file
#[derive(Debug, Clone, PartialEq)]
pub enum ReshapeOutcome {
    /// Tidy file written with this many records
    Written { output: PathBuf, records: usize },
    /// Nothing written
    Skipped { reason: String },
}

/// Indices of the columns that hold monthly values
///
/// Month-like headers win; totals are ignored. When no header looks like a
/// month every value column is used and period parsing decides later.
pub fn select_value_columns(headers: &[String]) -> Vec<usize> {
    let months: Vec<usize> = headers
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, h)| {
            is_month_header(h) && !NON_MONTH_HEADERS.contains(&h.trim().to_lowercase().as_str())
        })
        .map(|(i, _)| i)
        .collect();

    if months.is_empty() {
        (1..headers.len()).collect()
    } else {
        months
    }
}

/// Parses raw CSV text into sorted tidy records
///
/// `file_year` fills in the year for headers that only name a month.
/// Returns `None` when the text has no data rows.
pub fn reshape_csv(
    text: &str,
    file_year: Option<i32>,
    source_path: &Path,
) -> Result<Option<Vec<LedgerRecord>>, LedgerError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LedgerError::csv(source_path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() {
        return Ok(None);
    }

    let value_columns = select_value_columns(&headers);
    let periods: Vec<(usize, Option<i32>, Option<u32>)> = value_columns
        .iter()
        .map(|&idx| {
            let (year, month) = parse_period_label(&headers[idx]);
            (idx, year.or(file_year), month)
        })
        .collect();

    let mut rows = 0usize;
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| LedgerError::csv(source_path, e))?;
        rows += 1;

        let (kind, source) = split_category(row.get(0).unwrap_or(""));

        for &(idx, year, month) in &periods {
            let Some(month) = month else { continue };
            let Some(amount) = row.get(idx).and_then(parse_amount) else {
                continue;
            };

            records.push(LedgerRecord {
                year,
                month,
                kind: kind.clone(),
                source: source.clone(),
                amount,
            });
        }
    }

    if rows == 0 {
        return Ok(None);
    }

    records.sort_by(|a, b| a.tidy_order(b));
    debug!(
        file = %source_path.display(),
        rows,
        records = records.len(),
        "Reshaped raw export"
    );

    Ok(Some(records))
}

/// Converts one raw export into its tidy CSV
pub fn process_csv(input: &Path, output: &Path) -> Result<ReshapeOutcome, LedgerError> {
    let bytes = fs::read(input).map_err(|e| LedgerError::io(input, e))?;
    let text = String::from_utf8_lossy(&bytes);

    let Some(records) = reshape_csv(&text, year_from_filename(input), input)? else {
        info!("Skipped empty file: {}", input.display());
        return Ok(ReshapeOutcome::Skipped {
            reason: "no data rows".to_string(),
        });
    };

    write_records(output, &records)?;
    info!("Saved tidy file: {}", output.display());

    Ok(ReshapeOutcome::Written {
        output: output.to_path_buf(),
        records: records.len(),
    })
}
