//! Semester intakes and the mapping from free-text semester labels.
//!
//! The university runs three intakes per year. Sources describe the intake
//! with free text ("2024/2025 Advent", "Jan (Easter Semester)", "Sem 1"), so
//! every fact table resolves its semester through [`semester_id_for`].

use chrono::{Datelike, NaiveDate};

/// One of the three fixed intakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Semester {
    pub id: i64,
    pub name: &'static str,
    /// Month and day the intake's teaching starts, used when a payment
    /// carries no explicit semester start date.
    pub start_month: u32,
    pub start_day: u32,
}

pub const SEMESTERS: [Semester; 3] = [
    Semester {
        id: 1,
        name: "Jan (Easter Semester)",
        start_month: 1,
        start_day: 15,
    },
    Semester {
        id: 2,
        name: "May (Trinity Semester)",
        start_month: 5,
        start_day: 15,
    },
    Semester {
        id: 3,
        name: "September (Advent)",
        start_month: 8,
        start_day: 29,
    },
];

const DEFAULT_SEMESTER_ID: i64 = 1;

/// Map a free-text semester label onto an intake id.
///
/// Substring rules are matched in order; anything unrecognised (including an
/// empty label) falls into the January intake.
pub fn semester_id_for(label: &str) -> i64 {
    let label = label.to_lowercase();
    if label.contains("jan") || label.contains("easter") {
        1
    } else if label.contains("may") || label.contains("trinity") {
        2
    } else if label.contains("september") || label.contains("advent") {
        3
    } else {
        DEFAULT_SEMESTER_ID
    }
}

/// Look up an intake by id.
pub fn semester(id: i64) -> Option<&'static Semester> {
    SEMESTERS.iter().find(|s| s.id == id)
}

/// Teaching start date of an intake in a given year.
pub fn default_start_date(semester_id: i64, year: i32) -> Option<NaiveDate> {
    let s = semester(semester_id).unwrap_or(&SEMESTERS[0]);
    NaiveDate::from_ymd_opt(year, s.start_month, s.start_day)
}

/// The intake whose start date is the latest one on or before `date`.
pub fn semester_for_date(date: NaiveDate) -> &'static Semester {
    SEMESTERS
        .iter()
        .rev()
        .find(|s| (date.month(), date.day()) >= (s.start_month, s.start_day))
        .unwrap_or(&SEMESTERS[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(semester_id_for("Jan (Easter Semester)"), 1);
        assert_eq!(semester_id_for("2024 Easter"), 1);
        assert_eq!(semester_id_for("May intake"), 2);
        assert_eq!(semester_id_for("TRINITY"), 2);
        assert_eq!(semester_id_for("September (Advent)"), 3);
        assert_eq!(semester_id_for("2024/2025 advent"), 3);
    }

    #[test]
    fn test_unknown_label_defaults_to_january() {
        assert_eq!(semester_id_for(""), 1);
        assert_eq!(semester_id_for("2023/2024 Sem 1"), 1);
    }

    #[test]
    fn test_default_start_date() {
        assert_eq!(
            default_start_date(3, 2025),
            NaiveDate::from_ymd_opt(2025, 8, 29)
        );
        assert_eq!(
            default_start_date(99, 2025),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
    }

    #[test]
    fn test_semester_for_date() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        assert_eq!(semester_for_date(d(1, 10)).id, 3);
        assert_eq!(semester_for_date(d(2, 1)).id, 1);
        assert_eq!(semester_for_date(d(6, 1)).id, 2);
        assert_eq!(semester_for_date(d(8, 29)).id, 3);
    }
}
