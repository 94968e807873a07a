//! Calendar helpers: lenient date parsing and day decomposition.
//!
//! Source systems render dates in several shapes (`2025-08-29`,
//! `29-08-2025`, `2025-08-29 10:15:00`, `2025-08-29T10:15:00.250`). Parsing
//! never fails hard here; callers decide what an absent date defaults to.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d/%m/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Parse a calendar date, accepting date-only and timestamp renderings.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    parse_timestamp(value).map(|ts| ts.date())
}

/// Parse a timestamp; a date-only value is taken as midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
    }
    // Zone suffixes ("+00", "Z") are dropped: the warehouse stores local time.
    if value.len() > 19 && value.is_char_boundary(19) {
        for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(ts) = NaiveDateTime::parse_from_str(&value[..19], fmt) {
                return Some(ts);
            }
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Warehouse date key (`YYYYMMDD`) for a date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Academic year label for a date, e.g. `2025-2026` from August onwards.
pub fn academic_year_label(date: NaiveDate) -> String {
    let start = if date.month() >= 8 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{}", start, start + 1)
}

/// Every day from `start` to `end`, inclusive.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Decomposition of one calendar day, as stored in the time dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayParts {
    pub date_key: String,
    pub date: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    pub month_name: String,
    pub day: u32,
    /// Monday = 0 .. Sunday = 6
    pub day_of_week: u32,
    pub day_name: String,
    pub is_weekend: bool,
}

impl DayParts {
    pub fn of(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            date_key: date_key(date),
            date,
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            month_name: date.format("%B").to_string(),
            day: date.day(),
            day_of_week,
            day_name: date.format("%A").to_string(),
            is_weekend: day_of_week >= 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_and_day_first() {
        assert_eq!(parse_date("2025-08-29"), Some(ymd(2025, 8, 29)));
        assert_eq!(parse_date("29-08-2025"), Some(ymd(2025, 8, 29)));
    }

    #[test]
    fn test_parse_date_from_timestamp() {
        assert_eq!(parse_date("2025-11-20 14:03:11"), Some(ymd(2025, 11, 20)));
        assert_eq!(parse_date("2025-11-20T14:03:11.500"), Some(ymd(2025, 11, 20)));
        assert_eq!(parse_date("2025-11-20 14:03:11+00"), Some(ymd(2025, 11, 20)));
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_timestamp("2025-13-40"), None);
    }

    #[test]
    fn test_timestamp_from_date_is_midnight() {
        let ts = parse_timestamp("2025-08-29").unwrap();
        assert_eq!(ts.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_day_parts() {
        // 2025-08-30 is a Saturday
        let parts = DayParts::of(ymd(2025, 8, 30));
        assert_eq!(parts.date_key, "20250830");
        assert_eq!(parts.quarter, 3);
        assert_eq!(parts.day_of_week, 5);
        assert_eq!(parts.day_name, "Saturday");
        assert_eq!(parts.month_name, "August");
        assert!(parts.is_weekend);
    }

    #[test]
    fn test_days_between_inclusive() {
        let days: Vec<_> = days_between(ymd(2024, 2, 27), ymd(2024, 3, 1)).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[2], ymd(2024, 2, 29));
    }

    #[test]
    fn test_academic_year_label() {
        assert_eq!(academic_year_label(ymd(2025, 9, 1)), "2025-2026");
        assert_eq!(academic_year_label(ymd(2026, 3, 1)), "2025-2026");
    }
}
