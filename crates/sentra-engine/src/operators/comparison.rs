//! Equality and numeric comparison operators

use crate::error::EvaluationError;
use sentra_core::{Condition, ConditionOperator, Value};

/// Equality over typed values.
///
/// Strings compare with the condition's case sensitivity; if either side
/// is a `Number`, both are coerced numerically so `"404" == 404` holds.
/// `Null` never equals anything, which lets rules handle missing fields
/// gracefully.
pub(super) fn equals(left: &Value, right: &Value, case_sensitive: bool) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(l), Value::String(r)) => {
            if case_sensitive {
                l == r
            } else {
                l.eq_ignore_ascii_case(r)
            }
        }
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            match (left.coerce_number(), right.coerce_number()) {
                (Some(l), Some(r)) => l == r,
                _ => false,
            }
        }
        _ => left == right,
    }
}

/// Ordered numeric comparison.
///
/// Both operands coerce to a canonical f64; non-numeric input is a
/// no-match rather than an error.
pub(super) fn compare_numeric(op: ConditionOperator, left: &Value, right: &Value) -> bool {
    let (Some(l), Some(r)) = (left.coerce_number(), right.coerce_number()) else {
        return false;
    };

    match op {
        ConditionOperator::GreaterThan => l > r,
        ConditionOperator::LessThan => l < r,
        ConditionOperator::GreaterOrEqual => l >= r,
        ConditionOperator::LessOrEqual => l <= r,
        _ => false,
    }
}

/// Inclusive range check against the condition's `[min, max]` operand
pub(super) fn in_range(condition: &Condition, left: &Value) -> Result<bool, EvaluationError> {
    let (min, max) = condition
        .range_bounds()
        .map_err(|e| EvaluationError::InvalidOperand {
            field: condition.field.clone(),
            reason: e.to_string(),
        })?;

    Ok(match left.coerce_number() {
        Some(n) => n >= min && n <= max,
        None => false,
    })
}
