//! Deadlines command implementation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use cw_core::deadline::{deadline_status, parse_semester_start, required_payment, Residency};
use cw_core::{evaluate_payment, DeadlineEvaluation, Milestone};

use crate::cli::{DeadlinesArgs, GlobalArgs};
use crate::logging;

use super::common::format_amount;

/// One schedule line: date, offset, kind and amount rule
pub(crate) fn milestone_line(milestone: &Milestone) -> String {
    let rule = match (milestone.tuition_percent, milestone.penalty_percent) {
        (Some((min, max)), _) if min == max => format!("{}% of tuition", min),
        (Some((min, max)), _) => format!("{}-{}% of tuition", min, max),
        (None, Some(pct)) => format!("{}% penalty on the balance", pct),
        (None, None) => String::new(),
    };
    format!(
        "{}  week {:>2}  {:<24} {}",
        milestone.date,
        milestone.weeks_from_start,
        milestone.kind.description(),
        rule
    )
}

pub(crate) fn evaluation_line(paid_on: NaiveDate, evaluation: &DeadlineEvaluation) -> String {
    if evaluation.met {
        format!(
            "Payment on {} meets {} ({} weeks to spare)",
            paid_on,
            evaluation.milestone_type.description(),
            evaluation.weeks_from_deadline
        )
    } else {
        format!(
            "Payment on {} is late: {}, {} weeks past the full-fees deadline, penalty {}",
            paid_on,
            evaluation.milestone_type.description(),
            evaluation.weeks_from_deadline,
            format_amount(evaluation.penalty_amount)
        )
    }
}

/// Execute the deadlines command
pub async fn execute(args: &DeadlinesArgs, global: &GlobalArgs) -> Result<()> {
    logging::init(global.verbose, None)?;

    let start = parse_semester_start(&args.start).context("Invalid --start")?;
    let today = match &args.on {
        Some(on) => parse_semester_start(on).context("Invalid --on")?,
        None => chrono::Local::now().date_naive(),
    };
    let status = deadline_status(start, today);
    let evaluation = args
        .on
        .as_ref()
        .map(|_| evaluate_payment(today, start, args.outstanding));
    let residency = if args.resident {
        Residency::Resident
    } else {
        Residency::NonResident
    };

    if args.json {
        let mut out = serde_json::json!({ "semester_start": start, "status": status });
        if let Some(evaluation) = &evaluation {
            out["evaluation"] = serde_json::to_value(evaluation)?;
        }
        if let Some(tuition) = args.tuition {
            let due: Vec<_> = status
                .schedule
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "milestone": m.kind,
                        "required": required_payment(
                            residency,
                            tuition,
                            args.functional_fees,
                            args.accommodation,
                            m.kind,
                        ),
                    })
                })
                .collect();
            out["required"] = serde_json::Value::Array(due);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Semester starting {}\n", start);
    for milestone in &status.schedule {
        println!("  {}", milestone_line(milestone));
    }
    println!();
    match &status.current {
        Some(m) => println!("As of {}: past {}", today, m.kind.description()),
        None => println!("As of {}: the semester has not started", today),
    }
    if let Some(next) = &status.next {
        println!(
            "Next: {} on {} ({} days)",
            next.kind.description(),
            next.date,
            (next.date - today).num_days()
        );
    }

    if let Some(evaluation) = &evaluation {
        println!("\n{}", evaluation_line(today, evaluation));
    }

    if let Some(tuition) = args.tuition {
        println!("\nAmount due by milestone:");
        for milestone in status.schedule.iter().filter(|m| !m.kind.is_late_window()) {
            let due = required_payment(
                residency,
                tuition,
                args.functional_fees,
                args.accommodation,
                milestone.kind,
            );
            println!(
                "  {:<24} {:>16}  (tuition {:>16} at {}%)",
                milestone.kind.description(),
                format_amount(due.total_required),
                format_amount(due.required_tuition),
                due.tuition_percent
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "deadlines_test.rs"]
mod tests;
