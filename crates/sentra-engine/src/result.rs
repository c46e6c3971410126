//! Evaluation result types
//!
//! Everything the engine hands back to its caller: per-condition
//! outcomes, per-rule match records, action instructions, and the final
//! policy decision. Match records are transient; the engine keeps no
//! history and the caller owns persistence.

use chrono::{DateTime, Utc};
use sentra_core::{ActionType, ConditionOperator, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of evaluating one condition against a request context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    /// Field the condition read
    pub field: String,

    /// Operator applied
    pub operator: ConditionOperator,

    /// Final match flag, after negation
    pub matched: bool,

    /// Weight contributed toward the rule's confidence
    pub contribution: f64,

    /// The condition's declared weight
    pub weight: f64,

    /// Present when the operator failed and degraded to a no-match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Derived severity of a rule match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Derive severity from the match confidence, bumped one level when
    /// the rule carries a blocking action
    pub fn derive(confidence: f64, blocking: bool) -> Self {
        let base = if confidence >= 0.9 {
            Severity::Critical
        } else if confidence >= 0.75 {
            Severity::High
        } else if confidence >= 0.5 {
            Severity::Medium
        } else {
            Severity::Low
        };

        if blocking {
            base.escalate()
        } else {
            base
        }
    }

    fn escalate(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }
}

/// Structured instruction produced by the action executor.
///
/// The engine never performs the physical effect; `success` reports
/// whether the instruction could be constructed, and the caller's
/// adapter carries it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Kind of side effect requested
    pub action_type: ActionType,

    /// Rule that requested the action
    pub rule_id: String,

    /// Whether the instruction was constructed successfully
    pub success: bool,

    /// Resolved parameters for the caller's adapter
    #[serde(default)]
    pub parameters: HashMap<String, Value>,

    /// Human-readable summary of the instruction
    pub detail: String,

    /// Construction failure, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Record of one rule matching one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Unique match ID
    pub id: String,

    /// Rule that matched
    pub rule_id: String,

    /// Rule name, for audit display
    pub rule_name: String,

    /// Caller-assigned request ID, when present on the context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Per-condition outcomes with their contributions
    pub conditions: Vec<ConditionResult>,

    /// Aggregated confidence in [0, 1]
    pub confidence: f64,

    /// Derived severity
    pub severity: Severity,

    /// Instructions produced for this rule's actions
    pub actions: Vec<ActionResult>,

    /// When the match was produced
    pub timestamp: DateTime<Utc>,

    /// Time spent evaluating this rule, in microseconds
    pub processing_time_us: u64,
}

/// The engine's final verdict for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Allow or deny
    pub allow: bool,

    /// Every rule that matched, in evaluation order
    pub matched_rules: Vec<RuleMatch>,

    /// Action instructions from all matched rules, in execution order
    pub actions: Vec<ActionResult>,

    /// Total evaluation time, in milliseconds
    pub evaluation_time_ms: u64,

    /// Human-readable summary of the deciding rule
    pub reason: String,

    /// True when a timeout or cancellation cut evaluation short
    #[serde(default)]
    pub partial: bool,

    /// Non-fatal problems encountered during evaluation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl PolicyDecision {
    /// The default decision when no rule matches
    pub fn allow_default() -> Self {
        Self {
            allow: true,
            matched_rules: Vec::new(),
            actions: Vec::new(),
            evaluation_time_ms: 0,
            reason: "no rule matched".to_string(),
            partial: false,
            diagnostics: Vec::new(),
        }
    }

    /// IDs of all matched rules, in evaluation order
    pub fn matched_rule_ids(&self) -> Vec<&str> {
        self.matched_rules
            .iter()
            .map(|m| m.rule_id.as_str())
            .collect()
    }
}
