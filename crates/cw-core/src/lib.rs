//! cw-core - Core library for the campus warehouse
//!
//! This crate provides the pipeline configuration, the payment deadline
//! calculator, grading policy, semester and calendar helpers, and the run
//! state shared by every stage of the ETL.

pub mod calendar;
pub mod config;
pub mod deadline;
pub mod error;
pub mod fingerprint;
pub mod grading;
pub mod numeric;
pub mod run_state;
pub mod semester;
pub(crate) mod serde_helpers;
pub mod sql_utils;

pub use calendar::{parse_date, parse_timestamp, DayParts};
pub use config::{Config, SourceConfig, SourceType};
pub use deadline::{
    compute_deadlines, evaluate_payment, DeadlineEvaluation, Milestone, MilestoneKind,
};
pub use error::{CoreError, CoreResult};
pub use grading::{letter_grade, ExamStatus, GradingPolicy, ProgramCategory};
pub use run_state::{RunReport, RunStatus, Stage, StageReport};
pub use semester::{semester_id_for, Semester, SEMESTERS};
