//! Date keys
//!
//! Entries are keyed by a `YYYY-MM-DD` string in local time. These helpers
//! produce today's key and move between days.

use chrono::{Duration, Local, NaiveDate};
use thiserror::Error;

/// Format of every entry key
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateError {
    #[error("Invalid date '{0}': expected YYYY-MM-DD, today, yesterday, tomorrow or a day offset like -1")]
    Invalid(String),
}

/// Today's key in local time
pub fn today() -> String {
    format_date(Local::now().date_naive())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a strict `YYYY-MM-DD` key
pub fn parse_date(date: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| DateError::Invalid(date.to_string()))
}

/// Shift a date key by `delta` days
pub fn add_days(date: &str, delta: i64) -> Result<String, DateError> {
    let parsed = parse_date(date)?;
    shift(parsed, delta)
        .map(format_date)
        .ok_or_else(|| DateError::Invalid(date.to_string()))
}

/// Resolve user input relative to today
///
/// See [`resolve_from`] for the accepted forms.
pub fn resolve(input: &str) -> Result<String, DateError> {
    resolve_from(input, Local::now().date_naive())
}

/// Resolve user input relative to `base`
///
/// Accepts `YYYY-MM-DD`, `today`, `yesterday`, `tomorrow`, or a signed
/// day offset (`-1`, `+2`).
pub fn resolve_from(input: &str, base: NaiveDate) -> Result<String, DateError> {
    let trimmed = input.trim();
    let resolved = match trimmed.to_ascii_lowercase().as_str() {
        "today" => base,
        "yesterday" => base - Duration::days(1),
        "tomorrow" => base + Duration::days(1),
        other if other.starts_with('+') || other.starts_with('-') => {
            other
                .parse::<i64>()
                .ok()
                .and_then(|delta| shift(base, delta))
                .ok_or_else(|| DateError::Invalid(input.to_string()))?
        }
        _ => return parse_date(trimmed).map(format_date),
    };
    Ok(format_date(resolved))
}

/// `None` when the result would leave chrono's supported range
fn shift(date: NaiveDate, delta: i64) -> Option<NaiveDate> {
    Duration::try_days(delta).and_then(|d| date.checked_add_signed(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_add_days_across_month_boundary() {
        assert_eq!(add_days("2024-02-28", 1).unwrap(), "2024-02-29");
        assert_eq!(add_days("2024-02-29", 1).unwrap(), "2024-03-01");
        assert_eq!(add_days("2024-01-01", -1).unwrap(), "2023-12-31");
    }

    #[test]
    fn test_add_days_rejects_garbage() {
        assert!(add_days("not-a-date", 1).is_err());
    }

    #[test]
    fn test_resolve_keywords() {
        assert_eq!(resolve_from("today", base()).unwrap(), "2024-03-01");
        assert_eq!(resolve_from("Yesterday", base()).unwrap(), "2024-02-29");
        assert_eq!(resolve_from("tomorrow", base()).unwrap(), "2024-03-02");
    }

    #[test]
    fn test_resolve_offsets() {
        assert_eq!(resolve_from("-1", base()).unwrap(), "2024-02-29");
        assert_eq!(resolve_from("+7", base()).unwrap(), "2024-03-08");
        assert!(resolve_from("+x", base()).is_err());
        // Out of chrono's range is an error, not a panic
        assert!(resolve_from("-99999999999", base()).is_err());
    }

    #[test]
    fn test_resolve_explicit_date() {
        assert_eq!(resolve_from(" 2024-06-01 ", base()).unwrap(), "2024-06-01");
        assert!(matches!(
            resolve_from("2024-13-01", base()),
            Err(DateError::Invalid(_))
        ));
    }

    #[test]
    fn test_today_is_well_formed() {
        assert!(parse_date(&today()).is_ok());
    }
}
