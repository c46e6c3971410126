//! Error types for Sentra Core

use thiserror::Error;

/// Validation error raised when a rule, condition, or action is malformed.
///
/// Validation runs at load time; a rule that fails validation never
/// reaches evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid rule '{rule_id}': {reason}")]
    InvalidRule { rule_id: String, reason: String },

    #[error("Invalid condition on field '{field}': {reason}")]
    InvalidCondition { field: String, reason: String },

    #[error("Invalid {action_type} action: {reason}")]
    InvalidAction { action_type: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Invalid CIDR range '{range}': {reason}")]
    InvalidCidr { range: String, reason: String },
}

/// Template instantiation error.
///
/// Raised before a rule is created from a template; a template failure
/// never silently defaults.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Missing required variable '{variable}' for template '{template}'")]
    MissingVariable { template: String, variable: String },

    #[error("Variable '{variable}' has wrong type: expected {expected}, got {actual}")]
    WrongType {
        variable: String,
        expected: String,
        actual: String,
    },

    #[error("Template '{template}' produced an invalid rule: {source}")]
    InvalidRule {
        template: String,
        #[source]
        source: ValidationError,
    },
}

/// Result type for core validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::InvalidRule {
            rule_id: "r1".to_string(),
            reason: "no conditions".to_string(),
        };
        assert!(error.to_string().contains("r1"));
        assert!(error.to_string().contains("no conditions"));
    }

    #[test]
    fn test_template_error_display() {
        let error = TemplateError::MissingVariable {
            template: "sql_injection".to_string(),
            variable: "target_field".to_string(),
        };
        assert!(error.to_string().contains("sql_injection"));
        assert!(error.to_string().contains("target_field"));
    }

    #[test]
    fn test_template_error_wraps_validation() {
        let error = TemplateError::InvalidRule {
            template: "geo_block".to_string(),
            source: ValidationError::InvalidRule {
                rule_id: "geo_1".to_string(),
                reason: "no actions".to_string(),
            },
        };
        assert!(error.to_string().contains("geo_block"));
    }
}
