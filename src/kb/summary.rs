//! Markdown narratives derived from ledger records

use crate::ledger::LedgerRecord;
use std::collections::BTreeMap;

/// Months of trailing history a spike is measured against
pub const SPIKE_WINDOW: usize = 6;
/// Minimum z-score for a month to count as a spike
pub const SPIKE_Z_THRESHOLD: f64 = 2.5;
/// Expense sources listed in a year overview
pub const TOP_YEAR_SOURCES: usize = 5;

/// Formats money with thousands separators and two decimals: `-1,234.50`
pub fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Percentage change from `previous` to `current`; `None` when undefined
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || current.is_nan() || previous.is_nan() {
        return None;
    }
    Some(100.0 * (current - previous) / previous)
}

fn finish(lines: Vec<String>) -> String {
    format!("{}\n", lines.join("\n").trim())
}

fn total<'a>(records: impl Iterator<Item = &'a LedgerRecord>) -> f64 {
    records.map(|r| r.amount).sum()
}

/// Expense totals per source, largest first, ties by name
pub fn expense_by_source<'a>(
    records: impl Iterator<Item = &'a LedgerRecord>,
) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records.filter(|r| r.is_expense()) {
        if let Some(source) = record.source.as_deref() {
            *sums.entry(source).or_default() += record.amount;
        }
    }

    let mut ranked: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(source, amount)| (source.to_string(), amount))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Expense totals per (year, month), chronological
fn monthly_expenses<'a>(
    records: impl Iterator<Item = &'a LedgerRecord>,
) -> Vec<((i32, u32), f64)> {
    let mut sums: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in records.filter(|r| r.is_expense()) {
        if let Some(year) = record.year {
            *sums.entry((year, record.month)).or_default() += record.amount;
        }
    }
    sums.into_iter().collect()
}

/// Overview document for one year
pub fn year_summary(records: &[LedgerRecord], year: i32) -> String {
    let in_year = || records.iter().filter(move |r| r.year == Some(year));

    let income = total(in_year().filter(|r| r.is_income()));
    let expense = total(in_year().filter(|r| r.is_expense()));
    let savings = income - expense;

    let mut lines = vec![
        format!("# Year {} overview", year),
        format!("- Total income: {}", format_money(income)),
        format!("- Total expense: {}", format_money(expense)),
        format!("- Savings: {}", format_money(savings)),
    ];
    if income != 0.0 {
        lines.push(format!("- Savings rate: {:.1}%", savings / income * 100.0));
    }

    lines.push(String::new());
    lines.push("## Top expense categories".to_string());
    for (source, amount) in expense_by_source(in_year())
        .into_iter()
        .take(TOP_YEAR_SOURCES)
    {
        lines.push(format!("- {}: {}", source, format_money(amount)));
    }

    lines.push(String::new());
    lines.push("## Monthly expense trend".to_string());
    let mut previous: Option<f64> = None;
    for ((_, month), amount) in monthly_expenses(in_year()) {
        match previous.and_then(|prev| percent_change(amount, prev)) {
            Some(change) => lines.push(format!(
                "- {}-{:02}: {} (MoM {:+.1}%)",
                year,
                month,
                format_money(amount),
                change
            )),
            None => lines.push(format!("- {}-{:02}: {}", year, month, format_money(amount))),
        }
        previous = Some(amount);
    }

    finish(lines)
}

/// A month whose expense stands out from its trailing baseline
#[derive(Debug, Clone, PartialEq)]
pub struct Spike {
    pub year: i32,
    pub month: u32,
    pub amount: f64,
    pub z_score: f64,
}

/// Flags months whose total is at least [`SPIKE_Z_THRESHOLD`] sample standard
/// deviations above the mean of the preceding [`SPIKE_WINDOW`] months
pub fn detect_spikes(monthly: &[((i32, u32), f64)]) -> Vec<Spike> {
    if monthly.len() <= SPIKE_WINDOW {
        return Vec::new();
    }

    let mut spikes = Vec::new();
    for i in SPIKE_WINDOW..monthly.len() {
        let window: Vec<f64> = monthly[i - SPIKE_WINDOW..i].iter().map(|(_, v)| *v).collect();
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = variance.sqrt();
        if std.is_nan() || std <= 0.0 {
            continue;
        }

        let ((year, month), amount) = monthly[i];
        let z_score = (amount - mean) / std;
        if z_score >= SPIKE_Z_THRESHOLD {
            spikes.push(Spike {
                year,
                month,
                amount,
                z_score,
            });
        }
    }
    spikes
}

/// Narrative document for one source across all years
pub fn category_summary(records: &[LedgerRecord], source: &str) -> String {
    let for_source = || {
        records
            .iter()
            .filter(move |r| r.source.as_deref() == Some(source))
    };

    let income = total(for_source().filter(|r| r.is_income()));
    let expense = total(for_source().filter(|r| r.is_expense()));

    let mut lines = vec![format!("# Category: {}", source)];
    if expense != 0.0 {
        lines.push(format!("- Lifetime expense total: {}", format_money(expense)));
    }
    if income != 0.0 {
        lines.push(format!("- Lifetime income total: {}", format_money(income)));
    }

    let mut yearly: BTreeMap<(i32, &str), f64> = BTreeMap::new();
    for record in for_source() {
        if let (Some(year), Some(kind)) = (record.year, record.kind.as_deref()) {
            *yearly.entry((year, kind)).or_default() += record.amount;
        }
    }

    lines.push(String::new());
    lines.push("## Yearly totals".to_string());
    for ((year, kind), amount) in yearly {
        lines.push(format!("- {} {}: {}", year, kind, format_money(amount)));
    }

    let spikes = detect_spikes(&monthly_expenses(for_source()));
    if !spikes.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "## Notable spikes ({}-month z≥{})",
            SPIKE_WINDOW, SPIKE_Z_THRESHOLD
        ));
        for spike in spikes {
            lines.push(format!(
                "- Spike {}-{:02}: {} (z≈{:.1})",
                spike.year,
                spike.month,
                format_money(spike.amount),
                spike.z_score
            ));
        }
    }

    finish(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn rec(year: i32, month: u32, kind: &str, source: &str, amount: f64) -> LedgerRecord {
        LedgerRecord {
            year: Some(year),
            month,
            kind: Some(kind.to_string()),
            source: Some(source.to_string()),
            amount,
        }
    }

    #[parameterized(
        zero = { 0.0, "0.00" },
        small = { 7.5, "7.50" },
        hundreds = { 999.999, "1,000.00" },
        thousands = { 1234.5, "1,234.50" },
        millions = { 1234567.891, "1,234,567.89" },
        negative = { -12.0, "-12.00" },
        negative_thousands = { -98765.4, "-98,765.40" },
    )]
    fn test_format_money(value: f64, expected: &str) {
        assert_eq!(format_money(value), expected);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(110.0, 100.0), Some(10.0));
        assert_eq!(percent_change(50.0, 0.0), None);
    }

    #[test]
    fn test_year_summary_layout() {
        let records = vec![
            rec(2022, 1, "Income", "Salary", 4000.0),
            rec(2022, 2, "Income", "Salary", 4000.0),
            rec(2022, 1, "Expense", "Rent", 1500.0),
            rec(2022, 2, "Expense", "Rent", 1500.0),
            rec(2022, 2, "Expense", "Food", 300.0),
            rec(2021, 2, "Expense", "Food", 999.0),
        ];

        let expected = "\
# Year 2022 overview
- Total income: 8,000.00
- Total expense: 3,300.00
- Savings: 4,700.00
- Savings rate: 58.8%

## Top expense categories
- Rent: 3,000.00
- Food: 300.00

## Monthly expense trend
- 2022-01: 1,500.00
- 2022-02: 1,800.00 (MoM +20.0%)
";
        assert_eq!(year_summary(&records, 2022), expected);
    }

    #[test]
    fn test_year_summary_without_income_has_no_rate() {
        let records = vec![rec(2020, 3, "Expense", "Travel", 250.0)];
        let summary = year_summary(&records, 2020);

        assert!(!summary.contains("Savings rate"));
        assert!(summary.contains("- Savings: -250.00"));
        assert!(summary.ends_with("- 2020-03: 250.00\n"));
    }

    #[test]
    fn test_top_sources_are_capped_and_tie_broken_by_name() {
        let mut records = Vec::new();
        for (i, name) in ["F", "E", "D", "C", "B", "A"].iter().enumerate() {
            records.push(rec(2020, 1, "Expense", name, 100.0 + (i / 2) as f64));
        }
        let ranked = expense_by_source(records.iter());
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E", "F"]);

        let summary = year_summary(&records, 2020);
        assert!(summary.contains("- E: 100.00"));
        assert!(!summary.contains("- F: 100.00"));
    }

    #[test]
    fn test_category_summary_without_spikes() {
        let records = vec![
            rec(2021, 1, "Expense", "Utilities", 100.0),
            rec(2021, 2, "Expense", "Utilities", 110.0),
            rec(2022, 1, "Expense", "Utilities", 120.0),
            rec(2022, 1, "Income", "Utilities", 20.0),
            rec(2022, 1, "Expense", "Rent", 1000.0),
        ];

        let expected = "\
# Category: Utilities
- Lifetime expense total: 330.00
- Lifetime income total: 20.00

## Yearly totals
- 2021 Expense: 210.00
- 2022 Expense: 120.00
- 2022 Income: 20.00
";
        assert_eq!(category_summary(&records, "Utilities"), expected);
    }

    #[test]
    fn test_detect_spikes_after_stable_baseline() {
        let baseline = [100.0, 102.0, 98.0, 101.0, 99.0, 100.0];
        let mut monthly: Vec<((i32, u32), f64)> = baseline
            .iter()
            .enumerate()
            .map(|(i, v)| ((2021, i as u32 + 1), *v))
            .collect();
        monthly.push(((2021, 7), 400.0));
        monthly.push(((2021, 8), 101.0));

        let spikes = detect_spikes(&monthly);
        assert_eq!(spikes.len(), 1);
        assert_eq!((spikes[0].year, spikes[0].month), (2021, 7));
        assert!(spikes[0].z_score > 100.0);
    }

    #[test]
    fn test_detect_spikes_needs_history_and_variance() {
        let short: Vec<((i32, u32), f64)> = (1..=6).map(|m| ((2020, m), 10.0)).collect();
        assert!(detect_spikes(&short).is_empty());

        let mut flat: Vec<((i32, u32), f64)> = (1..=6).map(|m| ((2020, m), 10.0)).collect();
        flat.push(((2020, 7), 1000.0));
        assert!(detect_spikes(&flat).is_empty());
    }

    #[test]
    fn test_category_summary_lists_spikes() {
        let mut records: Vec<LedgerRecord> = [50.0, 52.0, 48.0, 51.0, 49.0, 50.0]
            .iter()
            .enumerate()
            .map(|(i, v)| rec(2023, i as u32 + 1, "Expense", "Medical", *v))
            .collect();
        records.push(rec(2023, 7, "Expense", "Medical", 900.0));

        let summary = category_summary(&records, "Medical");
        assert!(summary.contains("## Notable spikes (6-month z≥2.5)"));
        assert!(summary.contains("- Spike 2023-07: 900.00 (z≈"));
    }
}
