//! Grading policy: composite weights, failed-coursework threshold and the
//! letter-grade ladder.

use crate::numeric::round2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite weighting and failed-coursework threshold of one program
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradingPolicy {
    pub coursework_weight: f64,
    pub exam_weight: f64,
    /// Coursework strictly below this score is failed coursework (FCW)
    pub fcw_threshold: f64,
}

impl GradingPolicy {
    pub const DEFAULT: Self = Self {
        coursework_weight: 0.6,
        exam_weight: 0.4,
        fcw_threshold: 35.0,
    };

    pub const LAW: Self = Self {
        coursework_weight: 0.3,
        exam_weight: 0.7,
        fcw_threshold: 17.5,
    };

    /// Weighted grade; a missing exam contributes nothing.
    pub fn combine(&self, coursework: f64, exam: Option<f64>) -> f64 {
        round2(coursework * self.coursework_weight + exam.unwrap_or(0.0) * self.exam_weight)
    }

    pub fn is_fcw(&self, coursework: f64) -> bool {
        coursework < self.fcw_threshold
    }
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Program category that selects a grading policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgramCategory {
    #[default]
    Default,
    LawLike,
}

impl ProgramCategory {
    /// Classify a program by name: law-like when the lowercase name
    /// contains any of `keywords`.
    pub fn from_program_name(name: &str, keywords: &[String]) -> Self {
        let name = name.to_lowercase();
        if keywords
            .iter()
            .any(|k| !k.is_empty() && name.contains(&k.to_lowercase()))
        {
            ProgramCategory::LawLike
        } else {
            ProgramCategory::Default
        }
    }
}

/// Outcome tag of a grade row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamStatus {
    Completed,
    #[serde(rename = "MEX")]
    Mex,
    #[serde(rename = "FEX")]
    Fex,
    #[serde(rename = "FCW")]
    Fcw,
}

impl ExamStatus {
    pub const ALL: [ExamStatus; 4] = [
        ExamStatus::Completed,
        ExamStatus::Mex,
        ExamStatus::Fex,
        ExamStatus::Fcw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Completed => "Completed",
            ExamStatus::Mex => "MEX",
            ExamStatus::Fex => "FEX",
            ExamStatus::Fcw => "FCW",
        }
    }

    /// Parse a source status tag, case-insensitively. Blank input is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "COMPLETED" => Some(ExamStatus::Completed),
            "MEX" => Some(ExamStatus::Mex),
            "FEX" => Some(ExamStatus::Fex),
            "FCW" => Some(ExamStatus::Fcw),
            _ => None,
        }
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter grade from the numeric grade, the exam status and the FCW flag.
///
/// MEX, FEX and FCW outcomes replace the ladder letter with the status tag.
pub fn letter_grade(grade: f64, status: ExamStatus, fcw: bool) -> &'static str {
    if fcw {
        return ExamStatus::Fcw.as_str();
    }
    match status {
        ExamStatus::Completed => ladder(grade),
        other => other.as_str(),
    }
}

fn ladder(grade: f64) -> &'static str {
    if grade >= 80.0 {
        "A"
    } else if grade >= 75.0 {
        "B+"
    } else if grade >= 70.0 {
        "B"
    } else if grade >= 60.0 {
        "C"
    } else if grade >= 50.0 {
        "D"
    } else {
        "F"
    }
}

/// Derived fields of one grade row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeOutcome {
    pub coursework_score: f64,
    pub exam_score: Option<f64>,
    pub grade: f64,
    pub fcw: bool,
    pub exam_status: ExamStatus,
    pub letter_grade: &'static str,
}

/// Derive the stored grade fields from raw scores.
///
/// The exam score is absent exactly when the raw status is MEX; otherwise a
/// missing exam score counts as zero. FCW is always recomputed from the
/// coursework score, so a raw `FCW` tag on passing coursework resolves to
/// `Completed`.
pub fn compute_grade(
    policy: &GradingPolicy,
    coursework: f64,
    exam: Option<f64>,
    raw_status: Option<ExamStatus>,
) -> GradeOutcome {
    let coursework_score = round2(coursework);
    let exam_score = match raw_status {
        Some(ExamStatus::Mex) => None,
        _ => Some(round2(exam.unwrap_or(0.0))),
    };
    let grade = policy.combine(coursework_score, exam_score);
    let fcw = policy.is_fcw(coursework_score);
    let exam_status = if fcw {
        ExamStatus::Fcw
    } else {
        match raw_status {
            Some(ExamStatus::Fcw) | None => ExamStatus::Completed,
            Some(status) => status,
        }
    };
    GradeOutcome {
        coursework_score,
        exam_score,
        grade,
        fcw,
        exam_status,
        letter_grade: letter_grade(grade, exam_status, fcw),
    }
}

#[cfg(test)]
#[path = "grading_test.rs"]
mod tests;
