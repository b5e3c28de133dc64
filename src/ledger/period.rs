//! Month and year recognition in column headers and file names

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(19|20)\d{2}").expect("valid year regex"))
}

fn month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t|tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b",
        )
        .expect("valid month regex")
    })
}

/// Maps an upper-case month name or abbreviation to its number
pub fn month_number(token: &str) -> Option<u32> {
    let month = match token {
        "JAN" | "JANUARY" => 1,
        "FEB" | "FEBRUARY" => 2,
        "MAR" | "MARCH" => 3,
        "APR" | "APRIL" => 4,
        "MAY" => 5,
        "JUN" | "JUNE" => 6,
        "JUL" | "JULY" => 7,
        "AUG" | "AUGUST" => 8,
        "SEP" | "SEPT" | "SEPTEMBER" => 9,
        "OCT" | "OCTOBER" => 10,
        "NOV" | "NOVEMBER" => 11,
        "DEC" | "DECEMBER" => 12,
        _ => return None,
    };
    Some(month)
}

fn find_year(text: &str) -> Option<i32> {
    year_regex()
        .find(text)
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

fn find_month(text: &str) -> Option<u32> {
    month_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| month_number(&m.as_str().to_uppercase()))
}

/// True when the header names a month (`Jan`, `2020-Jan`, `Aug-24`)
pub fn is_month_header(header: &str) -> bool {
    month_regex().is_match(header.trim())
}

/// Extracts `(year, month)` from labels such as `2020 JAN`, `JAN 2020`,
/// `2021-August`, `Aug` or `AUG-20`
///
/// Either side is `None` when the label does not carry it. Two-digit years are
/// not interpreted.
pub fn parse_period_label(label: &str) -> (Option<i32>, Option<u32>) {
    let label = label.trim();
    (find_year(label), find_month(label))
}

/// Year embedded in a file name, e.g. `expenses_2021.csv`
pub fn year_from_filename(path: &Path) -> Option<i32> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(find_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        year_first = { "2020 JAN", Some(2020), Some(1) },
        month_first = { "JAN 2020", Some(2020), Some(1) },
        dashed_mixed_case = { "2020-Jan", Some(2020), Some(1) },
        full_name = { "2021-August", Some(2021), Some(8) },
        bare_month = { "Aug", None, Some(8) },
        two_digit_year = { "AUG-20", None, Some(8) },
        sept = { "Sept 1999", Some(1999), Some(9) },
        padded = { "  december  ", None, Some(12) },
        total = { "Total", None, None },
        year_only = { "FY 2019", Some(2019), None },
        glued_token = { "Jan2020", Some(2020), None },
    )]
    fn test_parse_period_label(label: &str, year: Option<i32>, month: Option<u32>) {
        assert_eq!(parse_period_label(label), (year, month));
    }

    #[parameterized(
        short = { "Mar", true },
        prefixed = { "2020-Jan", true },
        suffixed = { "Aug-24", true },
        total = { "Total", false },
        category = { "Category", false },
        may = { "may", true },
        mayor = { "Mayor", false },
    )]
    fn test_is_month_header(header: &str, expected: bool) {
        assert_eq!(is_month_header(header), expected);
    }

    #[test]
    fn test_year_from_filename_uses_file_name_only() {
        assert_eq!(
            year_from_filename(Path::new("/archive/1999/budget_2021.csv")),
            Some(2021)
        );
        assert_eq!(year_from_filename(Path::new("/2020/budget.csv")), None);
    }

    #[test]
    fn test_month_number_rejects_unknown() {
        assert_eq!(month_number("SEPT"), Some(9));
        assert_eq!(month_number("SPT"), None);
    }
}
