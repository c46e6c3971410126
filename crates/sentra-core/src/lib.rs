//! Sentra Core - Data model for the Sentra policy engine
//!
//! This crate provides the types shared across the Sentra ecosystem:
//! - `Value` for runtime data
//! - `Rule`, `Condition`, `Action` for the policy model
//! - `RuleTemplate` for parameterized rule bodies
//! - Validation error types

pub mod action;
pub mod condition;
pub mod error;
pub mod rule;
pub mod template;
pub mod types;

// Re-export commonly used types
pub use action::{Action, ActionType};
pub use condition::{CompiledMatcher, Condition, ConditionOperator, ValueType};
pub use error::{TemplateError, ValidationError};
pub use rule::{Rule, RuleStatus, RuleType};
pub use template::{RuleTemplate, TemplateVariable, VariableType};
pub use types::Value;
