//! Condition and rule evaluation
//!
//! Scores one condition, then aggregates a rule's condition scores into
//! a confidence value. Everything here is a pure function of the request
//! context; failures degrade to no-match results with diagnostics and
//! never abort the surrounding rule set.

use crate::context::RequestContext;
use crate::operators;
use crate::result::ConditionResult;
use sentra_core::{Condition, ConditionOperator, Rule};

/// Outcome of evaluating a whole rule against one context
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    /// Whether confidence reached the rule's threshold
    pub matched: bool,

    /// Aggregated weighted confidence in [0, 1]
    pub confidence: f64,

    /// Per-condition outcomes, in the rule's condition order
    pub conditions: Vec<ConditionResult>,
}

impl RuleEvaluation {
    /// Diagnostics from conditions whose operators failed
    pub fn diagnostics(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .filter_map(|c| c.diagnostic.as_deref())
    }
}

/// Evaluate one condition against a request context.
///
/// Missing fields behave per operator (`exists` → false, `not_exists` →
/// true, everything else → no-match); negation flips the match flag, and
/// the contribution follows the final flag.
pub fn evaluate_condition(condition: &Condition, context: &RequestContext) -> ConditionResult {
    let context_value = context.get(&condition.field);

    let (raw_matched, diagnostic) = match (condition.operator, context_value) {
        (ConditionOperator::Exists, value) => {
            (value.is_some_and(|v| !v.is_null()), None)
        }
        (ConditionOperator::NotExists, value) => {
            (!value.is_some_and(|v| !v.is_null()), None)
        }
        (_, None) => (false, None),
        (_, Some(value)) if value.is_null() => (false, None),
        (_, Some(value)) => match operators::apply(condition, value) {
            Ok(matched) => (matched, None),
            Err(e) => {
                // Fail closed: a broken operator is a no-match, reported
                // as a diagnostic rather than a fatal error
                tracing::debug!("condition on '{}' failed: {}", condition.field, e);
                (false, Some(e.to_string()))
            }
        },
    };

    let matched = raw_matched != condition.negate;
    let contribution = if matched { condition.weight } else { 0.0 };

    ConditionResult {
        field: condition.field.clone(),
        operator: condition.operator,
        matched,
        contribution,
        weight: condition.weight,
        diagnostic,
    }
}

/// Evaluate all of a rule's conditions and aggregate their weighted
/// contributions into a confidence value.
///
/// `confidence = Σ contribution / Σ weight`, clamped to [0, 1]; the rule
/// matches when confidence reaches its effective threshold. The default
/// threshold of 1.0 gives AND semantics.
pub fn evaluate_rule(
    rule: &Rule,
    context: &RequestContext,
    default_threshold: f64,
) -> RuleEvaluation {
    let conditions: Vec<ConditionResult> = rule
        .conditions
        .iter()
        .map(|condition| evaluate_condition(condition, context))
        .collect();

    let total_weight: f64 = conditions.iter().map(|c| c.weight).sum();
    let total_contribution: f64 = conditions.iter().map(|c| c.contribution).sum();

    let confidence = if total_weight > 0.0 {
        (total_contribution / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let matched = confidence >= rule.effective_threshold(default_threshold);

    RuleEvaluation {
        matched,
        confidence,
        conditions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentra_core::{Action, ActionType, RuleType, Value};

    fn context() -> RequestContext {
        RequestContext::new()
            .with_field("source_ip", "10.0.0.5")
            .with_field("method", "POST")
            .with_field("response_code", Value::from(404i64))
    }

    fn rule_with(conditions: Vec<Condition>) -> Rule {
        let mut rule = Rule::new("r1", "Test rule", RuleType::Signature)
            .add_action(Action::new(ActionType::Log));
        rule.conditions = conditions;
        rule
    }

    #[test]
    fn test_condition_match_contributes_weight() {
        let condition = Condition::new(
            "method",
            ConditionOperator::Equals,
            Some(Value::from("POST")),
        )
        .with_weight(2.5);

        let result = evaluate_condition(&condition, &context());
        assert!(result.matched);
        assert_eq!(result.contribution, 2.5);
    }

    #[test]
    fn test_condition_no_match_contributes_zero() {
        let condition = Condition::new(
            "method",
            ConditionOperator::Equals,
            Some(Value::from("GET")),
        )
        .with_weight(2.5);

        let result = evaluate_condition(&condition, &context());
        assert!(!result.matched);
        assert_eq!(result.contribution, 0.0);
    }

    #[test]
    fn test_missing_field_per_operator() {
        let exists = Condition::new("absent", ConditionOperator::Exists, None);
        assert!(!evaluate_condition(&exists, &context()).matched);

        let not_exists = Condition::new("absent", ConditionOperator::NotExists, None);
        assert!(evaluate_condition(&not_exists, &context()).matched);

        let equals = Condition::new("absent", ConditionOperator::Equals, Some(Value::from("x")));
        let result = evaluate_condition(&equals, &context());
        assert!(!result.matched);
        assert_eq!(result.contribution, 0.0);
    }

    #[test]
    fn test_negate_is_logical_negation_for_any_input() {
        let contexts = [
            context(),
            RequestContext::new(),
            RequestContext::new().with_field("method", Value::Null),
        ];
        let operators_and_values = [
            (ConditionOperator::Equals, Some(Value::from("POST"))),
            (ConditionOperator::Exists, None),
            (ConditionOperator::NotExists, None),
            (ConditionOperator::Contains, Some(Value::from("OS"))),
        ];

        for ctx in &contexts {
            for (op, value) in &operators_and_values {
                let plain = Condition::new("method", *op, value.clone());
                let negated = Condition::new("method", *op, value.clone()).with_negate(true);
                assert_ne!(
                    evaluate_condition(&plain, ctx).matched,
                    evaluate_condition(&negated, ctx).matched,
                    "negate must flip {:?}",
                    op
                );
            }
        }
    }

    #[test]
    fn test_negated_match_earns_contribution() {
        let condition = Condition::new(
            "method",
            ConditionOperator::Equals,
            Some(Value::from("GET")),
        )
        .with_negate(true)
        .with_weight(1.5);

        let result = evaluate_condition(&condition, &context());
        assert!(result.matched);
        assert_eq!(result.contribution, 1.5);
    }

    #[test]
    fn test_bad_regex_degrades_with_diagnostic() {
        let condition = Condition::new(
            "method",
            ConditionOperator::Regex,
            Some(Value::from("([unclosed")),
        );
        let result = evaluate_condition(&condition, &context());
        assert!(!result.matched);
        assert!(result.diagnostic.is_some());
    }

    #[test]
    fn test_rule_and_semantics_at_default_threshold() {
        let rule = rule_with(vec![
            Condition::new("method", ConditionOperator::Equals, Some(Value::from("POST"))),
            Condition::new(
                "source_ip",
                ConditionOperator::Equals,
                Some(Value::from("10.0.0.5")),
            ),
        ]);

        let evaluation = evaluate_rule(&rule, &context(), 1.0);
        assert!(evaluation.matched);
        assert_eq!(evaluation.confidence, 1.0);

        let rule = rule_with(vec![
            Condition::new("method", ConditionOperator::Equals, Some(Value::from("POST"))),
            Condition::new(
                "source_ip",
                ConditionOperator::Equals,
                Some(Value::from("10.9.9.9")),
            ),
        ]);

        let evaluation = evaluate_rule(&rule, &context(), 1.0);
        assert!(!evaluation.matched);
        assert_eq!(evaluation.confidence, 0.5);
    }

    #[test]
    fn test_partial_threshold_matches_on_one_of_two() {
        let mut rule = rule_with(vec![
            Condition::new("method", ConditionOperator::Equals, Some(Value::from("POST"))),
            Condition::new("method", ConditionOperator::Equals, Some(Value::from("PUT"))),
        ]);
        rule.threshold = Some(0.5);

        let evaluation = evaluate_rule(&rule, &context(), 1.0);
        assert!(evaluation.matched);
        assert_eq!(evaluation.confidence, 0.5);
    }

    #[test]
    fn test_weighted_confidence() {
        let rule = rule_with(vec![
            Condition::new("method", ConditionOperator::Equals, Some(Value::from("POST")))
                .with_weight(3.0),
            Condition::new("method", ConditionOperator::Equals, Some(Value::from("PUT")))
                .with_weight(1.0),
        ]);

        let evaluation = evaluate_rule(&rule, &context(), 1.0);
        assert_eq!(evaluation.confidence, 0.75);
    }

    #[test]
    fn test_confidence_monotonic_in_matched_conditions() {
        let base = rule_with(vec![Condition::new(
            "method",
            ConditionOperator::Equals,
            Some(Value::from("POST")),
        )]);
        let base_confidence = evaluate_rule(&base, &context(), 1.0).confidence;

        let extended = rule_with(vec![
            Condition::new("method", ConditionOperator::Equals, Some(Value::from("POST"))),
            Condition::new(
                "response_code",
                ConditionOperator::Equals,
                Some(Value::from(404i64)),
            ),
        ]);
        let extended_confidence = evaluate_rule(&extended, &context(), 1.0).confidence;

        assert!(extended_confidence >= base_confidence);
    }

    #[test]
    fn test_zero_total_weight_yields_zero_confidence() {
        let rule = rule_with(vec![Condition::new(
            "method",
            ConditionOperator::Equals,
            Some(Value::from("POST")),
        )
        .with_weight(0.0)]);

        let evaluation = evaluate_rule(&rule, &context(), 1.0);
        assert_eq!(evaluation.confidence, 0.0);
        assert!(!evaluation.matched);
    }
}
