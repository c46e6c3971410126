//! Action execution
//!
//! Turns a matched rule's actions into structured instructions for the
//! caller's enforcement adapter. The engine itself performs no side
//! effects; "execution" here means validating parameters, filling in
//! per-type defaults, and ordering the instructions.

use crate::result::ActionResult;
use sentra_core::{Action, ActionType, Rule, Value};
use std::collections::HashMap;

/// Builds action instructions for matched rules.
///
/// Stateless; one executor serves the whole engine.
#[derive(Debug, Default)]
pub struct ActionExecutor;

impl ActionExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Produce instructions for every enabled action of a matched rule,
    /// in ascending priority order.
    ///
    /// A failing action yields a failed [`ActionResult`] and does not
    /// stop the remaining actions.
    pub fn execute_rule(&self, rule: &Rule) -> Vec<ActionResult> {
        let mut actions: Vec<&Action> = rule.actions.iter().filter(|a| a.enabled).collect();
        actions.sort_by_key(|a| a.priority);

        actions
            .into_iter()
            .map(|action| self.execute(action, rule))
            .collect()
    }

    fn execute(&self, action: &Action, rule: &Rule) -> ActionResult {
        if let Err(e) = action.validate() {
            tracing::warn!(
                rule_id = %rule.id,
                action = action.action_type.as_str(),
                "action failed validation: {}", e
            );
            return ActionResult {
                action_type: action.action_type,
                rule_id: rule.id.clone(),
                success: false,
                parameters: action.parameters.clone(),
                detail: format!("{} action from rule '{}'", action.action_type.as_str(), rule.id),
                error: Some(e.to_string()),
            };
        }

        let parameters = self.resolve_parameters(action);
        let detail = self.describe(action, rule, &parameters);

        tracing::debug!(
            rule_id = %rule.id,
            action = action.action_type.as_str(),
            "prepared action instruction"
        );

        ActionResult {
            action_type: action.action_type,
            rule_id: rule.id.clone(),
            success: true,
            parameters,
            detail,
            error: None,
        }
    }

    /// Copy the action's parameters and fill in per-type defaults the
    /// enforcement adapter expects to find
    fn resolve_parameters(&self, action: &Action) -> HashMap<String, Value> {
        let mut parameters = action.parameters.clone();
        let default = |parameters: &mut HashMap<String, Value>, key: &str, value: Value| {
            parameters.entry(key.to_string()).or_insert(value);
        };

        match action.action_type {
            ActionType::Block => {
                default(&mut parameters, "scope", Value::from("source_ip"));
            }
            ActionType::RateLimit => {
                default(&mut parameters, "key", Value::from("source_ip"));
            }
            ActionType::Redirect => {
                default(&mut parameters, "status", Value::from(302i64));
            }
            ActionType::Challenge => {
                default(&mut parameters, "challenge_type", Value::from("captcha"));
            }
            ActionType::Log => {
                default(&mut parameters, "level", Value::from("info"));
            }
            _ => {}
        }

        parameters
    }

    fn describe(
        &self,
        action: &Action,
        rule: &Rule,
        parameters: &HashMap<String, Value>,
    ) -> String {
        match action.action_type {
            ActionType::Block => {
                let duration = parameters
                    .get("duration")
                    .and_then(|v| v.coerce_string())
                    .unwrap_or_default();
                format!("block for {} (rule '{}')", duration, rule.id)
            }
            ActionType::RateLimit => {
                let limit = parameters
                    .get("limit")
                    .and_then(|v| v.coerce_string())
                    .unwrap_or_default();
                let window = parameters
                    .get("window")
                    .and_then(|v| v.coerce_string())
                    .unwrap_or_default();
                format!("rate limit {}/{} (rule '{}')", limit, window, rule.id)
            }
            ActionType::Redirect => {
                let location = parameters
                    .get("location")
                    .and_then(|v| v.coerce_string())
                    .unwrap_or_default();
                format!("redirect to {} (rule '{}')", location, rule.id)
            }
            ActionType::Alert => {
                let severity = parameters
                    .get("severity")
                    .and_then(|v| v.coerce_string())
                    .unwrap_or_default();
                format!("alert [{}] for rule '{}'", severity, rule.id)
            }
            other => format!("{} action from rule '{}'", other.as_str(), rule.id),
        }
    }
}
