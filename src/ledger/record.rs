use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Category label for money coming in
pub const INCOME: &str = "Income";
/// Category label for money going out
pub const EXPENSE: &str = "Expense";

/// One tidy ledger row: a single amount for one category in one month
///
/// Column names match the tidy CSV header `Year,Month,Type,Source,Amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Month")]
    pub month: u32,
    /// Left side of a `Type - Source` category label (`Income`, `Expense`, ...)
    #[serde(rename = "Type")]
    pub kind: Option<String>,
    /// Right side of a `Type - Source` category label
    #[serde(rename = "Source")]
    pub source: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: f64,
}

impl LedgerRecord {
    pub fn is_income(&self) -> bool {
        self.kind.as_deref() == Some(INCOME)
    }

    pub fn is_expense(&self) -> bool {
        self.kind.as_deref() == Some(EXPENSE)
    }

    /// Ordering used for tidy output: year, month, type, source, missing last
    pub fn tidy_order(&self, other: &Self) -> Ordering {
        cmp_none_last(&self.year, &other.year)
            .then_with(|| self.month.cmp(&other.month))
            .then_with(|| cmp_none_last(&self.kind, &other.kind))
            .then_with(|| cmp_none_last(&self.source, &other.source))
    }
}

fn cmp_none_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Splits a `Type - Source` label on its first separator
///
/// A label without the separator is all type and no source.
pub fn split_category(label: &str) -> (Option<String>, Option<String>) {
    let label = label.trim();
    if label.is_empty() {
        return (None, None);
    }

    match label.split_once(" - ") {
        Some((kind, source)) => (non_empty(kind), non_empty(source)),
        None => (Some(label.to_string()), None),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
