//! Cell coercion helpers.
//!
//! Raw cells arrive as text (from CSV, or from spreadsheet cells rendered to
//! text by [`crate::io_utils`]). These helpers turn them into typed values.
//! Every parser returns an error for unparseable input; callers decide whether
//! the failure is fatal or becomes a missing marker.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// Serial 60 is the phantom 1900-02-29; anything past ~year 2500 is not a date.
const EXCEL_SERIAL_MIN: f64 = 61.0;
const EXCEL_SERIAL_MAX: f64 = 219_000.0;

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Converts an Excel serial day number into a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(EXCEL_SERIAL_MIN..EXCEL_SERIAL_MAX).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 once the 1900 leap year bug is accounted for
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Parses a sales date cell. Returns `Ok(None)` for blank cells.
pub fn parse_date_cell(value: &str) -> Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = parse_naive_date(trimmed) {
        return Ok(Some(date));
    }
    if let Ok(datetime) = parse_naive_datetime(trimmed) {
        return Ok(Some(datetime.date()));
    }
    if let Ok(serial) = trimmed.parse::<f64>()
        && let Some(date) = excel_serial_to_date(serial)
    {
        return Ok(Some(date));
    }
    bail!("Failed to parse '{trimmed}' as date")
}

/// Parses a numeric cell. Returns `Ok(None)` for blank cells.
pub fn parse_number_cell(value: &str) -> Result<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed: f64 = trimmed
        .parse()
        .with_context(|| format!("Failed to parse '{trimmed}' as number"))?;
    if !parsed.is_finite() {
        bail!("Non-finite number '{trimmed}'");
    }
    Ok(Some(parsed))
}

/// Parses an integer code cell such as `YEAR` or `MONTH`. Spreadsheets often
/// store these as floats, so `2024.0` is accepted while `2024.5` is not.
pub fn parse_integer_cell(value: &str) -> Result<Option<i64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(Some(parsed));
    }
    let parsed: f64 = trimmed
        .parse()
        .with_context(|| format!("Failed to parse '{trimmed}' as integer"))?;
    if parsed.fract() != 0.0 || !parsed.is_finite() {
        bail!("Failed to parse '{trimmed}' as integer");
    }
    Ok(Some(parsed as i64))
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let rendered = format!("{value:.4}");
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

pub fn format_date(value: Option<NaiveDate>) -> String {
    value
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
