//! Rule template model
//!
//! Templates are data, not code: a template carries a rule body with
//! `{{variable}}` placeholders plus declarations of the variables that
//! fill them. Instantiation happens in the engine crate.

use crate::rule::Rule;
use crate::types::Value;
use serde::{Deserialize, Serialize};

/// Declared type of a template variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    List,
}

impl VariableType {
    /// Whether `value` conforms to this variable type
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (VariableType::String, Value::String(_))
                | (VariableType::Number, Value::Number(_))
                | (VariableType::Boolean, Value::Bool(_))
                | (VariableType::List, Value::List(_))
        )
    }

    /// Human-readable type name, used in template errors
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Boolean => "boolean",
            VariableType::List => "list",
        }
    }
}

/// Declaration of one template variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVariable {
    /// Placeholder name (referenced as `{{name}}` in the rule body)
    pub name: String,

    /// Expected value type
    pub variable_type: VariableType,

    /// Default used when the caller omits the variable; required
    /// variables have no default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Whether the caller must supply this variable
    #[serde(default)]
    pub required: bool,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TemplateVariable {
    /// Declare a required variable
    pub fn required(name: impl Into<String>, variable_type: VariableType) -> Self {
        Self {
            name: name.into(),
            variable_type,
            default: None,
            required: true,
            description: None,
        }
    }

    /// Declare an optional variable with a default value
    pub fn optional(
        name: impl Into<String>,
        variable_type: VariableType,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            variable_type,
            default: Some(default),
            required: false,
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A parameterized rule body usable to stamp out concrete rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTemplate {
    /// Unique template ID
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Variable declarations
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,

    /// Rule body with `{{variable}}` placeholders in string values
    pub body: Rule,
}

impl RuleTemplate {
    /// Create a new template
    pub fn new(id: impl Into<String>, name: impl Into<String>, body: Rule) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            variables: Vec::new(),
            body,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a variable
    pub fn with_variable(mut self, variable: TemplateVariable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Look up a variable declaration by name
    pub fn variable(&self, name: &str) -> Option<&TemplateVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionType};
    use crate::condition::{Condition, ConditionOperator};
    use crate::rule::RuleType;

    fn template_body() -> Rule {
        Rule::new("tpl_body", "Template body", RuleType::Geo)
            .add_condition(Condition::new(
                "geo.country",
                ConditionOperator::InList,
                Some(Value::from("{{countries}}")),
            ))
            .add_action(
                Action::new(ActionType::Block)
                    .with_parameter("duration", Value::from("{{duration}}")),
            )
    }

    #[test]
    fn test_variable_type_accepts() {
        assert!(VariableType::String.accepts(&Value::from("x")));
        assert!(!VariableType::String.accepts(&Value::from(1i64)));
        assert!(VariableType::Number.accepts(&Value::from(1i64)));
        assert!(VariableType::List.accepts(&Value::List(vec![])));
        assert!(VariableType::Boolean.accepts(&Value::from(true)));
    }

    #[test]
    fn test_template_variable_lookup() {
        let template = RuleTemplate::new("geo_block", "Geo block", template_body())
            .with_variable(TemplateVariable::required("countries", VariableType::List))
            .with_variable(TemplateVariable::optional(
                "duration",
                VariableType::Number,
                Value::from(3600i64),
            ));

        assert!(template.variable("countries").unwrap().required);
        assert_eq!(
            template.variable("duration").unwrap().default,
            Some(Value::from(3600i64))
        );
        assert!(template.variable("missing").is_none());
    }

    #[test]
    fn test_template_serde_roundtrip() {
        let template = RuleTemplate::new("geo_block", "Geo block", template_body())
            .with_variable(TemplateVariable::required("countries", VariableType::List));

        let json = serde_json::to_string(&template).unwrap();
        let parsed: RuleTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(template, parsed);
    }
}
