//! Field coercion with default-on-failure.
//!
//! Source columns are looked up by a list of candidate names so the
//! relational tables (`AmountPaid`) and the flat-file feeds (`amount`) share
//! one conformer. A present value that does not convert is counted and
//! treated as absent; the caller picks the default. Values outside the
//! range their warehouse column can hold count as failures too.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use cw_core::{parse_date, parse_timestamp};
use cw_extract::RawTable;
use std::cell::Cell;
use std::ops::RangeInclusive;

/// Values an `INTEGER` column accepts
pub const INTEGER_RANGE: RangeInclusive<i64> = (i32::MIN as i64)..=(i32::MAX as i64);

/// Coursework and exam scores, stored as `DECIMAL(5,2)`
pub const SCORE_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Fee and payment amounts. Sums of several amounts must still fit
/// `DECIMAL(15,2)`.
pub const AMOUNT_RANGE: RangeInclusive<f64> = 0.0..=1_000_000_000_000.0;

/// Calendar years accepted for dates and the payment year
pub const YEAR_RANGE: RangeInclusive<i64> = 1900..=2199;

/// Parse a number, tolerating surrounding whitespace and thousands
/// separators.
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer; integral decimals such as `3.0` are accepted.
pub fn parse_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(i);
    }
    parse_number(trimmed)
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Read access to one raw row
pub struct Row<'a> {
    table: &'a RawTable,
    index: usize,
    failures: &'a Cell<usize>,
}

impl<'a> Row<'a> {
    pub fn new(table: &'a RawTable, index: usize, failures: &'a Cell<usize>) -> Self {
        Self {
            table,
            index,
            failures,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// First non-blank value among the candidate columns
    pub fn text(&self, candidates: &[&str]) -> Option<String> {
        candidates.iter().find_map(|name| {
            let idx = column_position(self.table, name)?;
            let value = self.table.rows.get(self.index)?.get(idx)?.as_deref()?;
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    }

    pub fn number_in(&self, candidates: &[&str], range: RangeInclusive<f64>) -> Option<f64> {
        self.convert(candidates, |v| parse_number(v).filter(|n| range.contains(n)))
    }

    pub fn int(&self, candidates: &[&str]) -> Option<i64> {
        self.convert(candidates, parse_int)
    }

    pub fn int_in(&self, candidates: &[&str], range: RangeInclusive<i64>) -> Option<i64> {
        self.convert(candidates, |v| parse_int(v).filter(|i| range.contains(i)))
    }

    pub fn flag(&self, candidates: &[&str]) -> Option<bool> {
        self.convert(candidates, parse_flag)
    }

    pub fn date(&self, candidates: &[&str]) -> Option<NaiveDate> {
        self.convert(candidates, |v| parse_date(v).filter(|d| in_years(d.year())))
    }

    pub fn timestamp(&self, candidates: &[&str]) -> Option<NaiveDateTime> {
        self.convert(candidates, |v| {
            parse_timestamp(v).filter(|ts| in_years(ts.year()))
        })
    }

    fn convert<T>(&self, candidates: &[&str], parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = self.text(candidates)?;
        let parsed = parse(&raw);
        if parsed.is_none() {
            self.failures.set(self.failures.get() + 1);
        }
        parsed
    }
}

fn in_years(year: i32) -> bool {
    YEAR_RANGE.contains(&i64::from(year))
}

/// Column position, exact match first, then ASCII case-insensitive
pub fn column_position(table: &RawTable, name: &str) -> Option<usize> {
    table.column_index(name).or_else(|| {
        table
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    })
}

/// Whether the table carries any of the candidate columns
pub fn has_any(table: &RawTable, candidates: &[&str]) -> bool {
    candidates
        .iter()
        .any(|c| column_position(table, c).is_some())
}

/// Iterate the rows of a table, sharing one failure counter
pub fn rows<'a>(table: &'a RawTable, failures: &'a Cell<usize>) -> impl Iterator<Item = Row<'a>> {
    (0..table.len()).map(move |i| Row::new(table, i, failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_db::TextResult;

    fn table() -> RawTable {
        RawTable::new(
            "finance",
            "student_fees",
            TextResult {
                columns: vec![
                    "AmountPaid".into(),
                    "payment_date".into(),
                    "Year".into(),
                    "Flag".into(),
                ],
                rows: vec![
                    vec![
                        Some("1,500,000".into()),
                        Some("29-08-2025".into()),
                        Some("2025.0".into()),
                        Some("yes".into()),
                    ],
                    vec![Some("abc".into()), Some("  ".into()), None, Some("maybe".into())],
                ],
            },
        )
    }

    #[test]
    fn test_candidates_and_parsing() {
        let t = table();
        let failures = Cell::new(0);
        let row = Row::new(&t, 0, &failures);
        assert_eq!(
            row.number_in(&["amount", "AmountPaid"], AMOUNT_RANGE),
            Some(1_500_000.0)
        );
        assert_eq!(row.date(&["PaymentDate", "payment_date"]), NaiveDate::from_ymd_opt(2025, 8, 29));
        assert_eq!(row.int(&["year"]), Some(2025));
        assert_eq!(row.flag(&["Flag"]), Some(true));
        assert_eq!(failures.get(), 0);
    }

    #[test]
    fn test_failures_counted_blank_not() {
        let t = table();
        let failures = Cell::new(0);
        let row = Row::new(&t, 1, &failures);
        assert_eq!(row.number_in(&["AmountPaid"], AMOUNT_RANGE), None);
        assert_eq!(row.date(&["payment_date"]), None);
        assert_eq!(row.int(&["Year"]), None);
        assert_eq!(row.flag(&["Flag"]), None);
        assert_eq!(row.text(&["Missing"]), None);
        // blank and NULL are absent, not failures
        assert_eq!(failures.get(), 2);
    }

    #[test]
    fn test_out_of_range_values_are_failures() {
        let t = RawTable::new(
            "grading",
            "grades",
            TextResult {
                columns: vec![
                    "CourseworkScore".into(),
                    "Credits".into(),
                    "Year".into(),
                    "ExamDate".into(),
                ],
                rows: vec![vec![
                    Some("1000".into()),
                    Some("3000000000".into()),
                    Some("20250".into()),
                    Some("9999-01-01".into()),
                ]],
            },
        );
        let failures = Cell::new(0);
        let row = Row::new(&t, 0, &failures);
        assert_eq!(row.number_in(&["CourseworkScore"], SCORE_RANGE), None);
        assert_eq!(row.int_in(&["Credits"], INTEGER_RANGE), None);
        assert_eq!(row.int_in(&["Year"], YEAR_RANGE), None);
        assert_eq!(row.date(&["ExamDate"]), None);
        assert_eq!(failures.get(), 4);

        // the unbounded readers still see the values
        assert_eq!(row.int(&["Credits"]), Some(3_000_000_000));
        assert_eq!(row.number_in(&["CourseworkScore"], 0.0..=1000.0), Some(1000.0));
        assert_eq!(failures.get(), 4);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("7"), Some(7));
        assert_eq!(parse_int("7.0"), Some(7));
        assert_eq!(parse_int("7.5"), None);
        assert_eq!(parse_int(""), None);
    }
}
