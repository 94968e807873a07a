//! Conform stage entry point

use crate::lookup::KeyMaps;
use crate::record::SilverData;
use crate::report::ConformReport;
use crate::{activity, catalog, finance, grade, org, student};
use chrono::NaiveDate;
use cw_core::Config;
use cw_extract::RawTable;
use log::info;

/// Logical source tables, in preference order. The first non-empty match
/// wins, so a relational table shadows its flat-file fallback feed.
pub const STUDENTS: &[&str] = &["students"];
pub const COURSES: &[&str] = &["courses"];
pub const FACULTIES: &[&str] = &["faculties"];
pub const DEPARTMENTS: &[&str] = &["departments"];
pub const PROGRAMS: &[&str] = &["programs"];
pub const ENROLLMENTS: &[&str] = &["enrollments"];
pub const ATTENDANCE: &[&str] = &["attendance"];
pub const PAYMENTS: &[&str] = &["student_fees", "payments", "payments_feed"];
pub const GRADES: &[&str] = &["grades", "grades_feed"];

/// Output of the conform stage
#[derive(Debug, Clone, Default)]
pub struct ConformOutput {
    pub data: SilverData,
    pub report: ConformReport,
}

/// Turns raw extracts into typed Silver records
pub struct Conformer<'a> {
    pub(crate) config: &'a Config,
    pub(crate) as_of: NaiveDate,
    tables: &'a [RawTable],
}

impl<'a> Conformer<'a> {
    /// `as_of` is resolved once per run by the caller; every default date
    /// and synthesised attribute is relative to it.
    pub fn new(config: &'a Config, tables: &'a [RawTable], as_of: NaiveDate) -> Self {
        Self {
            config,
            as_of,
            tables,
        }
    }

    /// First non-empty table matching one of `names`, in name order
    pub fn table(&self, names: &[&str]) -> Option<&'a RawTable> {
        names.iter().find_map(|name| {
            self.tables
                .iter()
                .find(|t| t.table.eq_ignore_ascii_case(name) && !t.is_empty())
        })
    }

    pub fn run(&self) -> ConformOutput {
        let mut report = ConformReport::default();
        let maps = KeyMaps::build(
            self.config,
            self.table(STUDENTS),
            self.table(COURSES),
            self.table(PROGRAMS),
        );

        let data = SilverData {
            faculties: org::faculties(self, &mut report),
            departments: org::departments(self, &mut report),
            programs: org::programs(self, &mut report),
            students: student::students(self, &mut report),
            courses: catalog::courses(self, &mut report),
            enrollments: activity::enrollments(self, &maps, &mut report),
            attendance: activity::attendance(self, &maps, &mut report),
            payments: finance::payments(self, &maps, &mut report),
            grades: grade::grades(self, &maps, &mut report),
        };

        info!(
            "Conformed {} students, {} courses, {} enrollments, {} attendance marks, {} payments, {} grades",
            data.students.len(),
            data.courses.len(),
            data.enrollments.len(),
            data.attendance.len(),
            data.payments.len(),
            data.grades.len()
        );

        ConformOutput { data, report }
    }
}
