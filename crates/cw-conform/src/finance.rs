//! Tuition payment conformance

use crate::coerce::{parse_int, rows, AMOUNT_RANGE, YEAR_RANGE};
use crate::conformer::{Conformer, PAYMENTS};
use crate::lookup::KeyMaps;
use crate::record::{PaymentRecord, StudentType};
use crate::report::ConformReport;
use chrono::Datelike;
use cw_core::numeric::round2;
use cw_core::semester::{default_start_date, semester_for_date};
use cw_core::{evaluate_payment, semester_id_for};
use std::cell::Cell;

/// `PAY######` from a numeric source id; other values pass through.
pub fn synth_payment_id(raw: &str) -> String {
    match parse_int(raw) {
        Some(n) => format!("PAY{:06}", n),
        None => raw.trim().to_string(),
    }
}

/// Balance left after a payment, never negative
pub fn outstanding_balance(tuition: f64, functional_fees: f64, amount: f64) -> f64 {
    round2((tuition + functional_fees - amount).max(0.0))
}

pub(crate) fn payments(
    ctx: &Conformer<'_>,
    maps: &KeyMaps,
    report: &mut ConformReport,
) -> Vec<PaymentRecord> {
    let Some(table) = ctx.table(PAYMENTS) else {
        report.record("payments", 0, 0);
        return Vec::new();
    };
    let failures = Cell::new(0);
    let mut out = Vec::with_capacity(table.len());

    for row in rows(table, &failures) {
        let timestamp = row.timestamp(&["PaymentTimestamp", "payment_timestamp"]);
        let payment_date = row
            .date(&["PaymentDate", "payment_date"])
            .or_else(|| timestamp.map(|ts| ts.date()));
        let payment_timestamp =
            timestamp.or_else(|| payment_date.and_then(|d| d.and_hms_opt(0, 0, 0)));

        let year = row
            .int_in(&["Year", "year"], YEAR_RANGE)
            .or_else(|| payment_date.map(|d| i64::from(d.year())))
            .unwrap_or_else(|| i64::from(ctx.as_of.year()));

        let semester_id = match row.text(&["Semester", "semester"]) {
            Some(label) => semester_id_for(&label),
            None => payment_date.map(|d| semester_for_date(d).id).unwrap_or(1),
        };

        let semester_start_date = row
            .date(&["SemesterStartDate", "semester_start_date"])
            .or_else(|| {
                i32::try_from(year)
                    .ok()
                    .and_then(|y| default_start_date(semester_id, y))
            });

        let fee = |candidates: &[&str]| {
            round2(row.number_in(candidates, AMOUNT_RANGE).unwrap_or(0.0))
        };
        let tuition_national = fee(&["TuitionNational", "tuition_national"]);
        let tuition_international = fee(&["TuitionInternational", "tuition_international"]);
        let functional_fees = fee(&["FunctionalFees", "functional_fees"]);
        let amount = fee(&["AmountPaid", "amount"]);

        let student_type = if tuition_international > 0.0 {
            StudentType::International
        } else {
            StudentType::National
        };
        let outstanding = outstanding_balance(
            tuition_national + tuition_international,
            functional_fees,
            amount,
        );

        let deadline = match (payment_date, semester_start_date) {
            (Some(paid), Some(start)) => Some(evaluate_payment(paid, start, outstanding)),
            _ => None,
        };

        out.push(PaymentRecord {
            payment_id: row
                .text(&["PaymentID", "payment_id"])
                .map(|id| synth_payment_id(&id))
                .unwrap_or_else(|| synth_payment_id(&(row.index() + 1).to_string())),
            student_id: maps.resolve_student(&row),
            payment_date,
            payment_timestamp,
            semester_id,
            year,
            tuition_national,
            tuition_international,
            functional_fees,
            amount,
            payment_method: row
                .text(&["PaymentMethod", "payment_method"])
                .unwrap_or_else(|| ctx.config.defaults.payment_method.clone()),
            status: row
                .text(&["Status", "status"])
                .unwrap_or_else(|| "Completed".to_string()),
            student_type,
            semester_start_date,
            outstanding,
            deadline,
        });
    }

    let undated = out.iter().filter(|p| p.payment_date.is_none()).count();
    if undated > 0 {
        report.warn(format!(
            "payments: {} payments have no resolvable date and cannot be loaded",
            undated
        ));
    }
    report.record("payments", out.len(), failures.get());
    out
}
