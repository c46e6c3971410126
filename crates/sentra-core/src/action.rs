//! Action model for Sentra rules
//!
//! Actions describe what to do when a rule matches. The engine never
//! performs the physical effect itself; it validates parameters and
//! emits structured instructions for the caller's adapters.

use crate::error::{Result, ValidationError};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of side effect an action requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Block,
    Allow,
    RateLimit,
    Alert,
    Log,
    Redirect,
    Transform,
    Challenge,
    Notify,
    UpdateRule,
}

impl ActionType {
    /// Parameters that must be present before the action can be attached
    /// to a rule
    pub fn required_parameters(&self) -> &'static [&'static str] {
        match self {
            ActionType::Block => &["duration"],
            ActionType::RateLimit => &["limit", "window"],
            ActionType::Alert => &["severity"],
            ActionType::Redirect => &["location"],
            ActionType::Notify => &["channel"],
            ActionType::UpdateRule => &["rule_id"],
            ActionType::Allow
            | ActionType::Log
            | ActionType::Transform
            | ActionType::Challenge => &[],
        }
    }

    /// Returns true if this action terminates the original request.
    ///
    /// Blocking actions decide the allow/deny verdict; everything else is
    /// collected as a side effect.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ActionType::Block | ActionType::Challenge | ActionType::Redirect
        )
    }

    /// Snake_case name, used in diagnostics and instruction payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Block => "block",
            ActionType::Allow => "allow",
            ActionType::RateLimit => "rate_limit",
            ActionType::Alert => "alert",
            ActionType::Log => "log",
            ActionType::Redirect => "redirect",
            ActionType::Transform => "transform",
            ActionType::Challenge => "challenge",
            ActionType::Notify => "notify",
            ActionType::UpdateRule => "update_rule",
        }
    }
}

/// A single action attached to a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Kind of side effect
    #[serde(rename = "type")]
    pub action_type: ActionType,

    /// Type-specific parameters
    #[serde(default)]
    pub parameters: HashMap<String, Value>,

    /// Execution order among actions of the same rule (ascending)
    #[serde(default)]
    pub priority: i32,

    /// Disabled actions are skipped by the executor
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Action {
    /// Create a new enabled action with no parameters
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            parameters: HashMap::new(),
            priority: 0,
            enabled: true,
            description: None,
        }
    }

    /// Add a parameter
    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Set the execution priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Disable this action
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate that all type-specific required parameters are present
    /// and non-null
    pub fn validate(&self) -> Result<()> {
        for param in self.action_type.required_parameters() {
            match self.parameters.get(*param) {
                Some(value) if !value.is_null() => {}
                _ => {
                    return Err(ValidationError::InvalidAction {
                        action_type: self.action_type.as_str().to_string(),
                        reason: format!("missing required parameter '{}'", param),
                    })
                }
            }
        }
        Ok(())
    }
}
