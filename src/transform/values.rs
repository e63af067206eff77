//! Permissive scalar parsing. The export is assumed pre-validated, so bad
//! values degrade to defaults instead of failing the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Normalize a source timestamp to `YYYY-MM-DDTHH:MM:SS.sssZ`. Values without
/// an offset are taken as UTC; anything unparsable is returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    let value = raw.trim();
    parse_utc(value)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| value.to_string())
}

pub fn optional_date(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(normalize_date)
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Non-nullable decimal; empty or unparsable becomes zero.
pub fn decimal(raw: &str) -> f64 {
    optional_decimal(Some(raw)).unwrap_or(0.0)
}

/// Nullable decimal, `.` as the decimal separator.
pub fn optional_decimal(raw: Option<&str>) -> Option<f64> {
    let value = raw.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => {
            tracing::debug!(value = %value, "Unparsable decimal");
            None
        }
    }
}

/// Integer column; tolerates a trailing `.00` and defaults to zero.
pub fn integer(raw: &str) -> i64 {
    let value = raw.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|n| n.trunc() as i64))
        .unwrap_or(0)
}

pub fn flag(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "True" | "TRUE")
}
