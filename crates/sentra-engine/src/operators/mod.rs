//! Operator library
//!
//! Pure, deterministic operator application. Every function here takes
//! the condition's operand and the extracted context value and returns a
//! boolean match. Expected type mismatches degrade to a no-match; only a
//! malformed operand (e.g. a bad regex that bypassed load-time
//! compilation) produces an `EvaluationError`.

mod collection;
mod comparison;
mod network;
mod strings;

use crate::error::EvaluationError;
use sentra_core::{Condition, ConditionOperator, Value};

/// Apply a condition's operator to the extracted context value.
///
/// Negation and weight handling live in the evaluator; this function
/// only answers "does the raw predicate hold".
pub fn apply(condition: &Condition, context_value: &Value) -> Result<bool, EvaluationError> {
    let expected = condition.value.as_ref();

    match condition.operator {
        ConditionOperator::Equals => Ok(comparison::equals(
            context_value,
            required(condition, expected)?,
            condition.case_sensitive,
        )),
        ConditionOperator::NotEquals => Ok(!comparison::equals(
            context_value,
            required(condition, expected)?,
            condition.case_sensitive,
        )),

        ConditionOperator::Contains => Ok(strings::contains(
            context_value,
            required(condition, expected)?,
            condition.case_sensitive,
        )),
        ConditionOperator::StartsWith => Ok(strings::starts_with(
            context_value,
            required(condition, expected)?,
            condition.case_sensitive,
        )),
        ConditionOperator::EndsWith => Ok(strings::ends_with(
            context_value,
            required(condition, expected)?,
            condition.case_sensitive,
        )),
        ConditionOperator::Regex => strings::regex_match(condition, context_value),

        ConditionOperator::GreaterThan
        | ConditionOperator::LessThan
        | ConditionOperator::GreaterOrEqual
        | ConditionOperator::LessOrEqual => Ok(comparison::compare_numeric(
            condition.operator,
            context_value,
            required(condition, expected)?,
        )),
        ConditionOperator::InRange => comparison::in_range(condition, context_value),

        ConditionOperator::InList => Ok(collection::in_list(
            context_value,
            required(condition, expected)?,
            condition.case_sensitive,
        )),
        ConditionOperator::NotInList => Ok(!collection::in_list(
            context_value,
            required(condition, expected)?,
            condition.case_sensitive,
        )),

        ConditionOperator::IpInRange => network::ip_in_range(condition, context_value),
        ConditionOperator::GeoLocation => Ok(network::geo_location(
            context_value,
            required(condition, expected)?,
        )),

        // Existence is resolved by the evaluator before operators run;
        // reaching here means the field was present.
        ConditionOperator::Exists => Ok(!context_value.is_null()),
        ConditionOperator::NotExists => Ok(context_value.is_null()),
    }
}

fn required<'a>(
    condition: &Condition,
    expected: Option<&'a Value>,
) -> Result<&'a Value, EvaluationError> {
    expected.ok_or_else(|| EvaluationError::InvalidOperand {
        field: condition.field.clone(),
        reason: format!("operator {:?} has no operand", condition.operator),
    })
}
