// Utility helpers for parsing and display formatting.
//
// CSV cells come in as loose strings; everything past the loader works on
// typed values and only comes back here to be rendered.
use num_format::{Locale, ToFormattedString};
use std::io::BufRead;

use crate::metrics::MetricId;

/// Placeholder for a value that cannot be shown (non-finite ratio).
pub const MISSING: &str = "N/A";

/// Read a claimants, volumes or cost cell. Spreadsheet exports write these
/// as `"12,000"` or `$1500`, so separators and the dollar sign are dropped;
/// blank cells and text such as `n/a` give `None`.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace([',', '$'], "");
    s.parse::<f64>().ok()
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Years sometimes arrive as `2021.0` from spreadsheet exports.
    s.parse::<i32>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0)
            .filter(|v| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(v))
            .map(|v| v as i32)
    })
}

/// One trimmed line from `reader`, or `None` once the input is closed.
pub fn read_answer<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// `Some(v)` only when `v` is a real number.
pub fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Fixed decimals with `en` thousands separators; non-finite renders as
/// missing.
pub fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return MISSING.to_string();
    }
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let whole = whole
        .parse::<u64>()
        .map(|w| w.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| whole.to_string());
    // No sign on values that round to zero.
    let sign = if n < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    if frac.is_empty() {
        format!("{}{}", sign, whole)
    } else {
        format!("{}{}.{}", sign, whole, frac)
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Render a metric value the way the dashboard shows it: whole numbers for
/// counts, `$` amounts for cost, two decimals for ratios.
pub fn format_metric(metric: MetricId, v: f64) -> String {
    if !v.is_finite() {
        return MISSING.to_string();
    }
    if metric.is_currency() {
        return format!("${}", format_number(v, 2));
    }
    match metric {
        MetricId::Cost => format!("${}", format_number(v, 0)),
        m if m.is_base() => format_number(v, 0),
        _ => format_number(v, 2),
    }
}

pub fn format_pct(v: f64) -> String {
    if !v.is_finite() {
        return MISSING.to_string();
    }
    format!("{:.1}%", v)
}

/// Growth annotation; absent or undefined growth renders as nothing, never 0%.
pub fn format_growth(g: Option<f64>) -> String {
    match g.and_then(finite) {
        Some(v) => format!("({:.1}% from previous year)", v),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_numbers() {
        assert_eq!(parse_f64_safe(Some(" 1,234.50 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("$99")), Some(99.0));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
        assert_eq!(parse_i32_safe(Some("2021")), Some(2021));
        assert_eq!(parse_i32_safe(Some("2021.0")), Some(2021));
        assert_eq!(parse_i32_safe(Some("2021.5")), None);
    }

    #[test]
    fn out_of_range_years_are_rejected() {
        assert_eq!(parse_i32_safe(Some("1e10")), None);
        assert_eq!(parse_i32_safe(Some("-3e9")), None);
        assert_eq!(parse_i32_safe(Some("inf")), None);
        assert_eq!(parse_i32_safe(Some("2.024e3")), Some(2024));
    }

    #[test]
    fn closed_input_gives_no_answer() {
        let mut input: &[u8] = b" 2 \nY\n";
        assert_eq!(read_answer(&mut input), Some("2".to_string()));
        assert_eq!(read_answer(&mut input), Some("Y".to_string()));
        assert_eq!(read_answer(&mut input), None);
        let mut blank: &[u8] = b"\n";
        assert_eq!(read_answer(&mut blank), Some(String::new()));
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(-0.004, 2), "0.00");
        assert_eq!(format_number(12.0, 0), "12");
        assert_eq!(format_number(f64::NAN, 2), MISSING);
        assert_eq!(format_int(9855), "9,855");
    }

    #[test]
    fn formats_metrics_by_kind() {
        assert_eq!(format_metric(MetricId::Claimants, 1200.4), "1,200");
        assert_eq!(format_metric(MetricId::Cost, 5000.0), "$5,000");
        assert_eq!(format_metric(MetricId::CostPerClaimant, 12.5), "$12.50");
        assert_eq!(format_metric(MetricId::ClaimsPerClaimant, 3.0), "3.00");
        assert_eq!(format_metric(MetricId::CostPerVolume, f64::INFINITY), MISSING);
    }

    #[test]
    fn absent_growth_is_not_zero() {
        assert_eq!(format_growth(None), "");
        assert_eq!(format_growth(Some(f64::INFINITY)), "");
        assert_eq!(format_growth(Some(0.0)), "(0.0% from previous year)");
        assert_eq!(format_growth(Some(50.0)), "(50.0% from previous year)");
    }
}
