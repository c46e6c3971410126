//! Condition model for Sentra rules
//!
//! A condition is a single testable predicate over one request field.
//! Conditions are validated and compiled once at rule-load time so the
//! evaluation hot path never parses a regex or CIDR range.

use crate::error::{Result, ValidationError};
use crate::types::Value;
use ipnet::IpNet;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Comparison operator applied by a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    // Equality
    Equals,
    NotEquals,

    // String
    Contains,
    StartsWith,
    EndsWith,
    Regex,

    // Numeric
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    InRange,

    // Collection
    InList,
    NotInList,

    // Network
    IpInRange,
    GeoLocation,

    // Existence
    Exists,
    NotExists,
}

impl ConditionOperator {
    /// Returns true if this operator needs an operand value
    pub fn requires_value(&self) -> bool {
        !matches!(self, ConditionOperator::Exists | ConditionOperator::NotExists)
    }

    /// Returns true if this is a numeric comparison operator
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ConditionOperator::GreaterThan
                | ConditionOperator::LessThan
                | ConditionOperator::GreaterOrEqual
                | ConditionOperator::LessOrEqual
                | ConditionOperator::InRange
        )
    }

    /// Returns true if this is a string operator
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            ConditionOperator::Contains
                | ConditionOperator::StartsWith
                | ConditionOperator::EndsWith
                | ConditionOperator::Regex
        )
    }
}

/// Declared type of a condition's operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Boolean,
    List,
    Regex,
}

/// Matcher compiled from a condition operand at load time
#[derive(Debug, Clone)]
pub enum CompiledMatcher {
    /// Compiled regex for `Regex` conditions
    Regex(Regex),
    /// Parsed CIDR ranges for `IpInRange` conditions
    Cidrs(Vec<IpNet>),
}

/// A single testable predicate over one request field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Name of the context field this condition reads (e.g. "source_ip")
    pub field: String,

    /// Comparison operator
    pub operator: ConditionOperator,

    /// Expected operand; `None` only for exists/not_exists
    #[serde(default)]
    pub value: Option<Value>,

    /// Declared operand type
    #[serde(default)]
    pub value_type: ValueType,

    /// Honor case for string operators
    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Invert the match result
    #[serde(default)]
    pub negate: bool,

    /// Non-negative contribution weight toward the rule's confidence
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Matcher compiled during validation; never serialized
    #[serde(skip)]
    pub compiled: Option<CompiledMatcher>,
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        // Compiled matchers are derived state and excluded from equality
        self.field == other.field
            && self.operator == other.operator
            && self.value == other.value
            && self.value_type == other.value_type
            && self.case_sensitive == other.case_sensitive
            && self.negate == other.negate
            && self.weight == other.weight
            && self.description == other.description
    }
}

impl Condition {
    /// Create a new condition with default weight 1.0
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: Option<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            value_type: ValueType::default(),
            case_sensitive: true,
            negate: false,
            weight: 1.0,
            description: None,
            compiled: None,
        }
    }

    /// Set the contribution weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Invert the match result
    pub fn with_negate(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    /// Make string comparisons case-insensitive
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Set the declared operand type
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate this condition's invariants.
    ///
    /// Checks operand presence, weight range, and that regex patterns and
    /// CIDR ranges parse. Does not cache the compiled matcher; use
    /// [`Condition::compile`] for that.
    pub fn validate(&self) -> Result<()> {
        if self.field.is_empty() {
            return Err(ValidationError::InvalidCondition {
                field: self.field.clone(),
                reason: "field name is empty".to_string(),
            });
        }

        if self.operator.requires_value() && self.value.is_none() {
            return Err(ValidationError::InvalidCondition {
                field: self.field.clone(),
                reason: format!("operator {:?} requires a value", self.operator),
            });
        }

        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ValidationError::InvalidCondition {
                field: self.field.clone(),
                reason: format!("weight must be a non-negative number, got {}", self.weight),
            });
        }

        match self.operator {
            ConditionOperator::Regex => {
                self.build_regex()?;
            }
            ConditionOperator::IpInRange => {
                self.parse_cidrs()?;
            }
            ConditionOperator::InRange => {
                self.range_bounds()?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Validate and cache the compiled matcher for this condition.
    ///
    /// Regexes compile once per rule load and are reused across
    /// evaluations; a pattern that fails to compile invalidates the
    /// condition here, never during evaluation.
    pub fn compile(&mut self) -> Result<()> {
        self.validate()?;
        self.compiled = match self.operator {
            ConditionOperator::Regex => Some(CompiledMatcher::Regex(self.build_regex()?)),
            ConditionOperator::IpInRange => Some(CompiledMatcher::Cidrs(self.parse_cidrs()?)),
            _ => None,
        };
        Ok(())
    }

    /// The cached compiled regex, if any
    pub fn compiled_regex(&self) -> Option<&Regex> {
        match &self.compiled {
            Some(CompiledMatcher::Regex(re)) => Some(re),
            _ => None,
        }
    }

    /// The cached parsed CIDR ranges, if any
    pub fn compiled_cidrs(&self) -> Option<&[IpNet]> {
        match &self.compiled {
            Some(CompiledMatcher::Cidrs(nets)) => Some(nets),
            _ => None,
        }
    }

    /// Parse the `in_range` operand into (min, max) bounds
    pub fn range_bounds(&self) -> Result<(f64, f64)> {
        let invalid = |reason: &str| ValidationError::InvalidCondition {
            field: self.field.clone(),
            reason: reason.to_string(),
        };

        let items = self
            .value
            .as_ref()
            .and_then(|v| v.as_list())
            .ok_or_else(|| invalid("in_range requires a [min, max] list"))?;

        if items.len() != 2 {
            return Err(invalid("in_range requires exactly two bounds"));
        }

        let min = items[0]
            .coerce_number()
            .ok_or_else(|| invalid("in_range lower bound is not numeric"))?;
        let max = items[1]
            .coerce_number()
            .ok_or_else(|| invalid("in_range upper bound is not numeric"))?;

        if min > max {
            return Err(invalid("in_range lower bound exceeds upper bound"));
        }

        Ok((min, max))
    }

    fn build_regex(&self) -> Result<Regex> {
        let pattern = self
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| ValidationError::InvalidCondition {
                field: self.field.clone(),
                reason: "regex operator requires a string pattern".to_string(),
            })?;

        RegexBuilder::new(pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| ValidationError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    fn parse_cidrs(&self) -> Result<Vec<IpNet>> {
        let value = self
            .value
            .as_ref()
            .ok_or_else(|| ValidationError::InvalidCondition {
                field: self.field.clone(),
                reason: "ip_in_range requires a CIDR value".to_string(),
            })?;

        let ranges: Vec<&str> = match value {
            Value::String(s) => vec![s.as_str()],
            Value::List(items) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect(),
            _ => {
                return Err(ValidationError::InvalidCondition {
                    field: self.field.clone(),
                    reason: "ip_in_range value must be a CIDR string or list".to_string(),
                })
            }
        };

        if ranges.is_empty() {
            return Err(ValidationError::InvalidCondition {
                field: self.field.clone(),
                reason: "ip_in_range has no CIDR ranges".to_string(),
            });
        }

        let mut nets = Vec::with_capacity(ranges.len());
        for range in ranges {
            // Accept bare addresses as /32 (or /128) host routes
            let parsed = range
                .parse::<IpNet>()
                .or_else(|_| range.parse::<std::net::IpAddr>().map(IpNet::from));
            match parsed {
                Ok(net) => nets.push(net),
                Err(e) => {
                    return Err(ValidationError::InvalidCidr {
                        range: range.to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        }

        Ok(nets)
    }
}
