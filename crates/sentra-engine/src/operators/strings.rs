//! String operators: contains, starts_with, ends_with, regex

use crate::error::EvaluationError;
use regex::RegexBuilder;
use sentra_core::{Condition, Value};

pub(super) fn contains(left: &Value, right: &Value, case_sensitive: bool) -> bool {
    with_strings(left, right, case_sensitive, |l, r| l.contains(r))
}

pub(super) fn starts_with(left: &Value, right: &Value, case_sensitive: bool) -> bool {
    with_strings(left, right, case_sensitive, |l, r| l.starts_with(r))
}

pub(super) fn ends_with(left: &Value, right: &Value, case_sensitive: bool) -> bool {
    with_strings(left, right, case_sensitive, |l, r| l.ends_with(r))
}

/// Regex match against the condition's compiled pattern.
///
/// The compiled matcher is cached at rule-load time; the on-the-fly
/// build only runs for conditions evaluated outside a snapshot, and a
/// pattern that fails to compile there surfaces as an evaluation error
/// (reported as a diagnostic, treated as a no-match).
pub(super) fn regex_match(
    condition: &Condition,
    context_value: &Value,
) -> Result<bool, EvaluationError> {
    let Some(haystack) = context_value.coerce_string() else {
        return Ok(false);
    };

    if let Some(re) = condition.compiled_regex() {
        return Ok(re.is_match(&haystack));
    }

    let pattern = condition
        .value
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or_else(|| EvaluationError::InvalidOperand {
            field: condition.field.clone(),
            reason: "regex operator requires a string pattern".to_string(),
        })?;

    let re = RegexBuilder::new(pattern)
        .case_insensitive(!condition.case_sensitive)
        .build()
        .map_err(|e| EvaluationError::InvalidOperand {
            field: condition.field.clone(),
            reason: format!("regex failed to compile: {}", e),
        })?;

    Ok(re.is_match(&haystack))
}

fn with_strings(
    left: &Value,
    right: &Value,
    case_sensitive: bool,
    predicate: impl Fn(&str, &str) -> bool,
) -> bool {
    let (Some(l), Some(r)) = (left.coerce_string(), right.coerce_string()) else {
        return false;
    };

    if case_sensitive {
        predicate(&l, &r)
    } else {
        predicate(&l.to_lowercase(), &r.to_lowercase())
    }
}
