//! Lenient parsing of money cells from spreadsheet exports

/// Parses a money cell into a signed amount
///
/// Accepts thousands separators, currency markers (`Rs`, `$`, `€`) and
/// accounting-style negatives in parentheses. Blank cells and a lone `-` mean
/// "no value".
pub fn parse_amount(cell: &str) -> Option<f64> {
    let mut s = cell.trim();
    if s.is_empty() || s == "-" {
        return None;
    }

    let negative = s.len() >= 2 && s.starts_with('(') && s.ends_with(')');
    if negative {
        s = &s[1..s.len() - 1];
    }

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == "-" {
        return None;
    }

    let value = cleaned.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}
