//! Payment deadline compliance.
//!
//! Every semester has four payment milestones followed by two weekly late
//! windows, all at fixed day offsets from the semester start:
//!
//! | milestone            | day | requirement        |
//! |----------------------|-----|--------------------|
//! | `prompt_payment`     | 0   | tuition 50–100%    |
//! | `registration`       | 28  | tuition 45–100%    |
//! | `midterm`            | 56  | tuition ≥ 75%      |
//! | `full_fees`          | 77  | tuition 100%       |
//! | `late_penalty_week1` | 84  | 5% penalty         |
//! | `late_penalty_week2` | 91  | 10% penalty        |
//!
//! Functional fees and (for residents) accommodation are due in full at every
//! payment milestone. Everything here is pure and deterministic.

use crate::calendar::parse_date;
use crate::error::{CoreError, CoreResult};
use crate::numeric::round2;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a milestone, in schedule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    PromptPayment,
    Registration,
    Midterm,
    FullFees,
    LatePenaltyWeek1,
    LatePenaltyWeek2,
}

impl MilestoneKind {
    pub const ALL: [MilestoneKind; 6] = [
        MilestoneKind::PromptPayment,
        MilestoneKind::Registration,
        MilestoneKind::Midterm,
        MilestoneKind::FullFees,
        MilestoneKind::LatePenaltyWeek1,
        MilestoneKind::LatePenaltyWeek2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneKind::PromptPayment => "prompt_payment",
            MilestoneKind::Registration => "registration",
            MilestoneKind::Midterm => "midterm",
            MilestoneKind::FullFees => "full_fees",
            MilestoneKind::LatePenaltyWeek1 => "late_penalty_week1",
            MilestoneKind::LatePenaltyWeek2 => "late_penalty_week2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }

    pub fn description(&self) -> &'static str {
        match self {
            MilestoneKind::PromptPayment => "Prompt Payment Option",
            MilestoneKind::Registration => "Registration Deadline",
            MilestoneKind::Midterm => "Midterm Deadline",
            MilestoneKind::FullFees => "Full Fees Deadline",
            MilestoneKind::LatePenaltyWeek1 => "Late Payment - Week 1",
            MilestoneKind::LatePenaltyWeek2 => "Late Payment - Week 2",
        }
    }

    /// Days from the semester start.
    pub fn day_offset(&self) -> i64 {
        match self {
            MilestoneKind::PromptPayment => 0,
            MilestoneKind::Registration => 28,
            MilestoneKind::Midterm => 56,
            MilestoneKind::FullFees => 77,
            MilestoneKind::LatePenaltyWeek1 => 84,
            MilestoneKind::LatePenaltyWeek2 => 91,
        }
    }

    /// Minimum and maximum tuition percentage due, for payment milestones.
    pub fn tuition_percent(&self) -> Option<(f64, f64)> {
        match self {
            MilestoneKind::PromptPayment => Some((50.0, 100.0)),
            MilestoneKind::Registration => Some((45.0, 100.0)),
            MilestoneKind::Midterm => Some((75.0, 100.0)),
            MilestoneKind::FullFees => Some((100.0, 100.0)),
            _ => None,
        }
    }

    /// Penalty on the outstanding balance, for late windows.
    pub fn penalty_percent(&self) -> Option<f64> {
        match self {
            MilestoneKind::LatePenaltyWeek1 => Some(5.0),
            MilestoneKind::LatePenaltyWeek2 => Some(10.0),
            _ => None,
        }
    }

    pub fn is_late_window(&self) -> bool {
        self.penalty_percent().is_some()
    }
}

impl fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled milestone of a semester.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub kind: MilestoneKind,
    pub date: NaiveDate,
    pub weeks_from_start: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuition_percent: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty_percent: Option<f64>,
}

impl Milestone {
    fn new(kind: MilestoneKind, semester_start: NaiveDate) -> Self {
        let offset = kind.day_offset();
        Self {
            kind,
            date: semester_start + Duration::days(offset),
            weeks_from_start: offset / 7,
            tuition_percent: kind.tuition_percent(),
            penalty_percent: kind.penalty_percent(),
        }
    }
}

/// Ordered milestone schedule of a semester starting on `semester_start`.
pub fn compute_deadlines(semester_start: NaiveDate) -> Vec<Milestone> {
    MilestoneKind::ALL
        .into_iter()
        .map(|kind| Milestone::new(kind, semester_start))
        .collect()
}

/// Deadline-compliance fields of one payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlineEvaluation {
    pub met: bool,
    pub milestone_type: MilestoneKind,
    /// Weeks before the met milestone, or weeks past the full-fees deadline
    /// for a late payment
    pub weeks_from_deadline: f64,
    pub penalty_amount: f64,
}

/// Evaluate a payment against the semester's milestone schedule.
///
/// The first payment milestone on or after `payment_date` is met. A payment
/// after the full-fees deadline is classified against the first late window
/// it falls within (the last window once every window has passed) and
/// charged that window's penalty on `outstanding`.
pub fn evaluate_payment(
    payment_date: NaiveDate,
    semester_start: NaiveDate,
    outstanding: f64,
) -> DeadlineEvaluation {
    let schedule = compute_deadlines(semester_start);
    let (payment_milestones, late_windows): (Vec<&Milestone>, Vec<&Milestone>) =
        schedule.iter().partition(|m| !m.kind.is_late_window());

    if let Some(m) = payment_milestones.iter().find(|m| payment_date <= m.date) {
        return DeadlineEvaluation {
            met: true,
            milestone_type: m.kind,
            weeks_from_deadline: weeks_between(payment_date, m.date),
            penalty_amount: 0.0,
        };
    }

    let full_fees = semester_start + Duration::days(MilestoneKind::FullFees.day_offset());
    let window = late_windows
        .iter()
        .find(|m| payment_date <= m.date)
        .or(late_windows.last())
        .map(|m| m.kind)
        .unwrap_or(MilestoneKind::LatePenaltyWeek2);
    let pct = window.penalty_percent().unwrap_or(0.0);

    DeadlineEvaluation {
        met: false,
        milestone_type: window,
        weeks_from_deadline: weeks_between(full_fees, payment_date),
        penalty_amount: round2(outstanding.max(0.0) * pct / 100.0),
    }
}

fn weeks_between(from: NaiveDate, to: NaiveDate) -> f64 {
    round2((to - from).num_days() as f64 / 7.0)
}

/// Whether the student lives in university accommodation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Residency {
    Resident,
    NonResident,
}

/// Amount due by a payment milestone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequiredPayment {
    pub required_tuition: f64,
    pub required_functional_fees: f64,
    pub required_accommodation: f64,
    pub total_required: f64,
    pub tuition_percent: f64,
}

/// Minimum amount due by `milestone`.
///
/// Late windows require the full balance, like the full-fees milestone.
/// Accommodation is only charged to residents.
pub fn required_payment(
    residency: Residency,
    tuition: f64,
    functional_fees: f64,
    accommodation: f64,
    milestone: MilestoneKind,
) -> RequiredPayment {
    let (min_pct, _) = milestone.tuition_percent().unwrap_or((100.0, 100.0));
    let required_tuition = tuition * min_pct / 100.0;
    let required_accommodation = match residency {
        Residency::Resident => accommodation,
        Residency::NonResident => 0.0,
    };
    RequiredPayment {
        required_tuition: round2(required_tuition),
        required_functional_fees: round2(functional_fees),
        required_accommodation: round2(required_accommodation),
        total_required: round2(required_tuition + functional_fees + required_accommodation),
        tuition_percent: min_pct,
    }
}

/// Milestones on either side of a given day.
#[derive(Debug, Clone, Serialize)]
pub struct DeadlineStatus {
    pub today: NaiveDate,
    /// Latest milestone on or before `today`
    pub current: Option<Milestone>,
    /// Earliest milestone after `today`
    pub next: Option<Milestone>,
    pub schedule: Vec<Milestone>,
}

pub fn deadline_status(semester_start: NaiveDate, today: NaiveDate) -> DeadlineStatus {
    let schedule = compute_deadlines(semester_start);
    let current = schedule.iter().filter(|m| m.date <= today).last().cloned();
    let next = schedule.iter().find(|m| m.date > today).cloned();
    DeadlineStatus {
        today,
        current,
        next,
        schedule,
    }
}

/// Parse a semester start date given as `YYYY-MM-DD` or `DD-MM-YYYY`.
pub fn parse_semester_start(value: &str) -> CoreResult<NaiveDate> {
    parse_date(value).ok_or_else(|| CoreError::InvalidDate {
        value: value.to_string(),
    })
}

#[cfg(test)]
#[path = "deadline_test.rs"]
mod tests;
