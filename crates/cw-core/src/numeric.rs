//! Numeric helpers shared by the grading and deadline rules.

/// Round to two decimal places, the precision of every stored score and
/// money amount.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
