//! Rule model for the Sentra policy engine
//!
//! A rule combines an ordered set of weighted conditions (what to detect)
//! with an ordered set of actions (what to do), plus lifecycle metadata.

use crate::action::Action;
use crate::condition::Condition;
use crate::error::{Result, ValidationError};
use crate::types::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Detection category a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Signature,
    Anomaly,
    Behavioral,
    Reputation,
    RateLimit,
    Geo,
    Ml,
    Adaptive,
    Blocking,
    Validation,
    Transform,
    Monitoring,
    Compliance,
}

/// Lifecycle status of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
    Expired,
    Disabled,
}

/// An evaluatable policy rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule ID
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Detection category
    pub rule_type: RuleType,

    /// Lifecycle status
    #[serde(default)]
    pub status: RuleStatus,

    /// Evaluation priority; higher evaluates first, ties broken by ID
    #[serde(default)]
    pub priority: i32,

    /// Confidence threshold in [0,1]; `None` means the engine default
    /// (1.0, i.e. AND semantics) applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Conditions in evaluation order
    pub conditions: Vec<Condition>,

    /// Actions in declaration order (executed by ascending priority)
    pub actions: Vec<Action>,

    /// Service/route targets this rule applies to; empty means all.
    /// A trailing `*` matches any suffix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Free-form metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,

    /// Tags for grouping and lookup
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub tags: HashSet<String>,

    /// Author of the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Last editor of the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    /// Optional expiry; expired rules are skipped, not deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Marks short-lived rules (e.g. incident-response blocks)
    #[serde(default)]
    pub is_temporary: bool,

    /// Monotonic version, bumped on edit
    #[serde(default = "default_version")]
    pub version: u64,

    /// Cumulative match count (maintained by the caller from match records)
    #[serde(default)]
    pub trigger_count: u64,

    /// When the rule last matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered_at: Option<DateTime<Utc>>,

    /// Derived effectiveness score (see the performance tracker)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness_score: Option<f64>,
}

fn default_version() -> u64 {
    1
}

impl Rule {
    /// Create a new active rule with no conditions or actions yet.
    ///
    /// The rule is not valid until at least one condition and one action
    /// are added; call [`Rule::validate`] before use.
    pub fn new(id: impl Into<String>, name: impl Into<String>, rule_type: RuleType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            rule_type,
            status: RuleStatus::Active,
            priority: 0,
            threshold: None,
            conditions: Vec::new(),
            actions: Vec::new(),
            targets: Vec::new(),
            metadata: HashMap::new(),
            tags: HashSet::new(),
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
            expires_at: None,
            is_temporary: false,
            version: 1,
            trigger_count: 0,
            last_triggered_at: None,
            effectiveness_score: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the evaluation priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set an explicit confidence threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Add a condition
    pub fn add_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an action
    pub fn add_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Restrict the rule to specific service/route targets
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Set the expiry timestamp
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Mark the rule temporary
    pub fn temporary(mut self) -> Self {
        self.is_temporary = true;
        self
    }

    /// Set the lifecycle status
    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }

    /// The threshold this rule matches at, falling back to the engine
    /// default when unset
    pub fn effective_threshold(&self, default: f64) -> f64 {
        self.threshold.unwrap_or(default)
    }

    /// Whether the rule participates in evaluation right now
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Whether the rule participates in evaluation at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == RuleStatus::Active && !self.is_expired_at(now)
    }

    /// Whether the rule's expiry has passed
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the rule's expiry has passed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Whether this rule applies to the given service/route target.
    ///
    /// Empty target lists apply everywhere; a trailing `*` in a target
    /// entry matches any suffix.
    pub fn matches_target(&self, target: &str) -> bool {
        if self.targets.is_empty() {
            return true;
        }
        self.targets.iter().any(|t| {
            if t == "*" {
                true
            } else if let Some(prefix) = t.strip_suffix('*') {
                target.starts_with(prefix)
            } else {
                t == target
            }
        })
    }

    /// Whether any of this rule's enabled actions would deny the request
    pub fn has_blocking_action(&self) -> bool {
        self.actions
            .iter()
            .any(|a| a.enabled && a.action_type.is_blocking())
    }

    /// Record an edit: bump the version and update timestamps
    pub fn mark_updated(&mut self, updated_by: Option<String>) {
        self.version += 1;
        self.updated_at = Utc::now();
        if updated_by.is_some() {
            self.updated_by = updated_by;
        }
    }

    /// Validate this rule's invariants and those of its conditions and
    /// actions
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| ValidationError::InvalidRule {
            rule_id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("rule ID is empty"));
        }
        if self.name.is_empty() {
            return Err(invalid("rule name is empty"));
        }
        if self.conditions.is_empty() {
            return Err(invalid("rule has no conditions"));
        }
        if self.actions.is_empty() {
            return Err(invalid("rule has no actions"));
        }
        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(invalid("threshold must be in [0, 1]"));
            }
        }

        for condition in &self.conditions {
            condition.validate()?;
        }
        for action in &self.actions {
            action.validate()?;
        }

        // All-zero weights can never produce nonzero confidence
        if self.conditions.iter().all(|c| c.weight == 0.0) {
            return Err(invalid("all condition weights are zero"));
        }

        Ok(())
    }

    /// Validate and compile all conditions (regexes, CIDR ranges) in place
    pub fn compile(&mut self) -> Result<()> {
        self.validate()?;
        for condition in &mut self.conditions {
            condition.compile()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionType;
    use crate::condition::ConditionOperator;
    use chrono::Duration;

    fn sample_rule() -> Rule {
        Rule::new("sqli_1", "SQL injection probe", RuleType::Signature)
            .with_priority(90)
            .add_condition(Condition::new(
                "path",
                ConditionOperator::Contains,
                Some(Value::from("union select")),
            ))
            .add_action(
                Action::new(ActionType::Block).with_parameter("duration", Value::from(3600i64)),
            )
    }

    #[test]
    fn test_valid_rule() {
        assert!(sample_rule().validate().is_ok());
    }

    #[test]
    fn test_rule_without_conditions_invalid() {
        let mut rule = sample_rule();
        rule.conditions.clear();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_rule_without_actions_invalid() {
        let mut rule = sample_rule();
        rule.actions.clear();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_rule_all_zero_weights_invalid() {
        let mut rule = sample_rule();
        for condition in &mut rule.conditions {
            condition.weight = 0.0;
        }
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_rule_threshold_range() {
        let rule = sample_rule().with_threshold(1.5);
        assert!(rule.validate().is_err());

        let rule = sample_rule().with_threshold(0.5);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_effective_threshold_default() {
        let rule = sample_rule();
        assert_eq!(rule.effective_threshold(1.0), 1.0);

        let rule = sample_rule().with_threshold(0.6);
        assert_eq!(rule.effective_threshold(1.0), 0.6);
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let rule = sample_rule();
        assert!(!rule.is_expired_at(now));
        assert!(rule.is_active_at(now));

        let rule = sample_rule().with_expiry(now - Duration::seconds(1));
        assert!(rule.is_expired_at(now));
        assert!(!rule.is_active_at(now));

        // Expiry boundary is inclusive: now >= expires_at
        let rule = sample_rule().with_expiry(now);
        assert!(rule.is_expired_at(now));
    }

    #[test]
    fn test_inactive_statuses() {
        let now = Utc::now();
        for status in [RuleStatus::Inactive, RuleStatus::Expired, RuleStatus::Disabled] {
            let rule = sample_rule().with_status(status);
            assert!(!rule.is_active_at(now));
        }
    }

    #[test]
    fn test_target_matching() {
        let rule = sample_rule();
        assert!(rule.matches_target("api/payments"));

        let rule = sample_rule().with_targets(vec!["api/*".to_string()]);
        assert!(rule.matches_target("api/payments"));
        assert!(!rule.matches_target("admin/users"));

        let rule = sample_rule().with_targets(vec!["admin/users".to_string()]);
        assert!(rule.matches_target("admin/users"));
        assert!(!rule.matches_target("admin/users/1"));
    }

    #[test]
    fn test_clone_is_deep() {
        let original = sample_rule().with_tag("injection");
        let mut cloned = original.clone();

        cloned.conditions[0].field = "body".to_string();
        cloned.actions[0].priority = 99;
        cloned.tags.insert("mutated".to_string());
        cloned
            .metadata
            .insert("origin".to_string(), Value::from("clone"));

        assert_eq!(original.conditions[0].field, "path");
        assert_eq!(original.actions[0].priority, 0);
        assert!(!original.tags.contains("mutated"));
        assert!(original.metadata.is_empty());
    }

    #[test]
    fn test_mark_updated_bumps_version() {
        let mut rule = sample_rule();
        assert_eq!(rule.version, 1);
        rule.mark_updated(Some("analyst".to_string()));
        assert_eq!(rule.version, 2);
        assert_eq!(rule.updated_by.as_deref(), Some("analyst"));
    }

    #[test]
    fn test_has_blocking_action() {
        assert!(sample_rule().has_blocking_action());

        let rule = Rule::new("log_1", "Log POSTs", RuleType::Monitoring)
            .add_condition(Condition::new(
                "method",
                ConditionOperator::Equals,
                Some(Value::from("POST")),
            ))
            .add_action(Action::new(ActionType::Log));
        assert!(!rule.has_blocking_action());
    }
}
