// Cell parsing and number formatting shared by the loader, the normalizer
// and the report tables.
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Lenient spreadsheet number: surrounding blanks and thousands commas are
/// ignored; anything with letters (`N/A`, `nan`, `inf`) or that does not
/// parse to a finite value gives `None`.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.contains(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    s.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a date or date-time cell. Survey exports mix ISO timestamps,
/// `m/d/Y h:m:s AM` stamps and plain `d/m/Y` dates, so several layouts are
/// tried in turn. Date-only values land at midnight.
pub fn parse_datetime_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Convert an Excel serial day number (1900 date system) into a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // Largest serial Excel accepts is 9999-12-31.
    if !serial.is_finite() || !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let secs = (serial.fract() * 86_400.0).round() as i64;
    base.checked_add_signed(Duration::days(days) + Duration::seconds(secs))
}

/// Whole days from `start` to `end`; negative when `end` comes first.
pub fn days_diff(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Mean of `v`, 0 when empty.
pub fn average(v: &[f64]) -> f64 {
    ratio(v.iter().sum::<f64>(), v.len() as f64)
}

/// Division that yields 0 instead of NaN/inf when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Render a number the way a person would type it in a cell: integral values
/// lose the trailing `.0`.
pub fn number_to_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Fixed decimals with `,` thousands separators, e.g. `1,234,567.89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, frac) = match fixed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (fixed.as_str(), None),
    };
    let mut out = String::new();
    // no sign on values that round to zero
    if n < 0.0 && fixed.chars().any(|c| matches!(c, '1'..='9')) {
        out.push('-');
    }
    out.push_str(&whole.parse::<u64>().unwrap_or(0).to_formatted_string(&Locale::en));
    if let Some(f) = frac {
        out.push('.');
        out.push_str(f);
    }
    out
}

/// Integer counts for console messages (`1,204 rows loaded`).
pub fn format_int<T: ToFormattedString>(n: T) -> String {
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_leniently() {
        assert_eq!(parse_f64_safe(Some(" 1,250.5 ")), Some(1250.5));
        assert_eq!(parse_f64_safe(Some("-75.58")), Some(-75.58));
        assert_eq!(parse_f64_safe(Some("N/A")), None);
        assert_eq!(parse_f64_safe(Some("nan")), None);
        assert_eq!(parse_f64_safe(Some("   ")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn parses_survey_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime_safe(Some("2024-03-05 14:30:00")), Some(expected));
        assert_eq!(parse_datetime_safe(Some("2024-03-05T14:30:00")), Some(expected));
        assert_eq!(parse_datetime_safe(Some("3/5/2024 2:30:00 PM")), Some(expected));

        let midnight = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime_safe(Some("2024-03-05")), Some(midnight));
        assert_eq!(parse_datetime_safe(Some("05/03/2024")), Some(midnight));
        assert_eq!(parse_datetime_safe(Some("pendiente")), None);
    }

    #[test]
    fn converts_excel_serials() {
        let dt = excel_serial_to_datetime(45356.5).unwrap();
        assert_eq!(dt.to_string(), "2024-03-05 12:00:00");
        assert_eq!(excel_serial_to_datetime(-3.0), None);
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.0, 1), "-12.0");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(number_to_text(12.0), "12");
        assert_eq!(number_to_text(2.5), "2.5");
        assert_eq!(format_int(9855usize), "9,855");
    }

    #[test]
    fn ratio_guards_zero() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(6.0, 3.0), 2.0);
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0, 3.0]), 2.0);
    }
}
