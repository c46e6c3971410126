//! Engine error types

use sentra_core::{TemplateError, ValidationError};
use thiserror::Error;

/// Failure of a single operator application.
///
/// Evaluation errors degrade to a no-match for the affected condition
/// and surface as diagnostics; they never abort the rule or the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Operand types do not fit the operator
    #[error("Type mismatch on field '{field}': {reason}")]
    TypeMismatch { field: String, reason: String },

    /// Condition operand is malformed (e.g. an uncompiled bad regex)
    #[error("Invalid operand on field '{field}': {reason}")]
    InvalidOperand { field: String, reason: String },
}

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed rule/condition/action, rejected at load time
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Template instantiation failure
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Operator-level failure, reported when a caller evaluates a single
    /// condition strictly
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_error_display() {
        let error = EvaluationError::TypeMismatch {
            field: "amount".to_string(),
            reason: "expected number".to_string(),
        };
        assert!(error.to_string().contains("amount"));
        assert!(error.to_string().contains("expected number"));
    }

    #[test]
    fn test_validation_error_conversion() {
        let validation = ValidationError::InvalidRule {
            rule_id: "r1".to_string(),
            reason: "no conditions".to_string(),
        };
        let engine_error: EngineError = validation.into();
        assert!(engine_error.to_string().contains("Validation error"));
    }

    #[test]
    fn test_template_error_conversion() {
        let template = TemplateError::NotFound("xss".to_string());
        let engine_error: EngineError = template.into();
        assert!(engine_error.to_string().contains("Template error"));
    }
}
