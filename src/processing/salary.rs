//! Best-effort salary extraction from posting text.

use std::sync::LazyLock;

use regex::Regex;

/// `$125K - $150K`, `$120,000 - $140,000.00`
static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([0-9][0-9,]*)(?:\.([0-9]{2}))?\s*(K)?\s*-\s*\$([0-9][0-9,]*)(?:\.([0-9]{2}))?\s*(K)?")
        .unwrap()
});

/// `$125K`, `$125.5 K`
static SINGLE_K: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([0-9]+(?:\.[0-9]+)?)\s*K").unwrap());

/// `$89.04 to $99.04/hour`
static HOURLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([0-9]+(?:\.[0-9]+)?)\s*to\s*\$([0-9]+(?:\.[0-9]+)?)/hour").unwrap());

/// `$150,000.00`, `$85`
static SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([0-9][0-9,]*)(?:\.([0-9]{2}))?").unwrap());

/// Annualization factor for hourly figures: 40 hours, 52 weeks.
const HOURS_PER_YEAR: f64 = 40.0 * 52.0;

/// Extracts `(low, high)` salary bounds from free text.
///
/// Patterns are tried in order: range, single-K, hourly, single-dollar; the
/// first matching pattern wins. Hourly precedes single-dollar because hourly
/// text always contains a plain dollar figure that would otherwise shadow it.
/// A bound below 100 is read as "expressed in thousands" and multiplied by
/// 1000. No match is not an error; missing salary is legitimate.
pub fn parse_salary(text: &str) -> (Option<f64>, Option<f64>) {
    let bounds = range_bounds(text)
        .or_else(|| single_k_bounds(text))
        .or_else(|| hourly_bounds(text))
        .or_else(|| single_bounds(text));

    match bounds {
        Some((low, high)) => (Some(thousands(low)), Some(thousands(high))),
        None => (None, None),
    }
}

fn thousands(value: f64) -> f64 {
    if value < 100.0 { value * 1000.0 } else { value }
}

fn parse_number(digits: &str, cents: Option<&str>) -> Option<f64> {
    let mut cleaned = digits.replace(',', "");
    if let Some(cents) = cents {
        cleaned.push('.');
        cleaned.push_str(cents);
    }
    cleaned.parse().ok()
}

/// `401K` names a retirement plan, not a salary.
fn is_retirement_plan(digits: &str, k_suffix: bool) -> bool {
    k_suffix && digits == "401"
}

fn range_bounds(text: &str) -> Option<(f64, f64)> {
    for caps in RANGE.captures_iter(text) {
        let low_digits = caps.get(1)?.as_str();
        let high_digits = caps.get(4)?.as_str();
        let low_k = caps.get(3).is_some();
        let high_k = caps.get(6).is_some();
        if is_retirement_plan(low_digits, low_k) || is_retirement_plan(high_digits, high_k) {
            continue;
        }

        let low = parse_number(low_digits, caps.get(2).map(|m| m.as_str()))?
            * if low_k { 1000.0 } else { 1.0 };
        let high = parse_number(high_digits, caps.get(5).map(|m| m.as_str()))?
            * if high_k { 1000.0 } else { 1.0 };
        return Some((low, high));
    }
    None
}

fn single_k_bounds(text: &str) -> Option<(f64, f64)> {
    for caps in SINGLE_K.captures_iter(text) {
        let digits = caps.get(1)?.as_str();
        if is_retirement_plan(digits, true) {
            continue;
        }
        let value = digits.parse::<f64>().ok()? * 1000.0;
        return Some((value, value));
    }
    None
}

fn hourly_bounds(text: &str) -> Option<(f64, f64)> {
    let caps = HOURLY.captures(text)?;
    let low = caps.get(1)?.as_str().parse::<f64>().ok()? * HOURS_PER_YEAR;
    let high = caps.get(2)?.as_str().parse::<f64>().ok()? * HOURS_PER_YEAR;
    Some((low, high))
}

fn single_bounds(text: &str) -> Option<(f64, f64)> {
    for caps in SINGLE.captures_iter(text) {
        let whole = caps.get(0)?;
        let digits = caps.get(1)?.as_str();
        // Skip the `$401` of a `$401K` token the K patterns already refused.
        if digits == "401" && text[whole.end()..].starts_with('K') {
            continue;
        }
        let value = parse_number(digits, caps.get(2).map(|m| m.as_str()))?;
        return Some((value, value));
    }
    None
}
