//! Runtime value types for Sentra conditions and request contexts
//!
//! The `Value` enum represents every value the engine can extract from a
//! request context or carry as a condition operand. It is JSON-shaped but
//! typed, so operators can pattern-match exhaustively instead of relying
//! on runtime type assertions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Number value (f64 for simplicity, handles both int and float)
    Number(f64),
    /// String value
    String(String),
    /// List of values
    List(Vec<Value>),
    /// Object (key-value map)
    Object(HashMap<String, Value>),
}

impl Value {
    /// Returns true if this value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the string content, if this is a `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean content, if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the list content, if this is a `List`
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Coerce this value to a number for numeric comparison.
    ///
    /// Numbers pass through; numeric strings parse; everything else is
    /// `None`. Numeric operators treat `None` as a no-match rather than
    /// an error, so a type mismatch never aborts an evaluation.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Render this value as a string for string operators.
    ///
    /// Strings pass through; numbers and booleans render canonically.
    /// Lists and objects have no string form.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Human-readable type name, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Format a number without a trailing `.0` when it is integral
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Bool(true), Value::Bool(true));
        assert_eq!(Value::Number(42.0), Value::Number(42.0));
        assert_ne!(Value::Bool(true), Value::Bool(false));
        assert_ne!(Value::Number(1.0), Value::String("1".to_string()));
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(Value::Number(3.5).coerce_number(), Some(3.5));
        assert_eq!(Value::String("42".to_string()).coerce_number(), Some(42.0));
        assert_eq!(Value::String(" 7.5 ".to_string()).coerce_number(), Some(7.5));
        assert_eq!(Value::String("abc".to_string()).coerce_number(), None);
        assert_eq!(Value::Bool(true).coerce_number(), Some(1.0));
        assert_eq!(Value::Null.coerce_number(), None);
        assert_eq!(Value::List(vec![]).coerce_number(), None);
    }

    #[test]
    fn test_coerce_string() {
        assert_eq!(
            Value::String("hi".to_string()).coerce_string(),
            Some("hi".to_string())
        );
        assert_eq!(Value::Number(404.0).coerce_string(), Some("404".to_string()));
        assert_eq!(Value::Number(1.5).coerce_string(), Some("1.5".to_string()));
        assert_eq!(Value::Bool(false).coerce_string(), Some("false".to_string()));
        assert_eq!(Value::Null.coerce_string(), None);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::List(vec![]).type_name(), "list");
        assert_eq!(Value::Object(HashMap::new()).type_name(), "object");
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from("ip"), Value::String("ip".to_string()));
        assert_eq!(Value::from(10i64), Value::Number(10.0));
        assert_eq!(Value::from(true), Value::Bool(true));
    }

    #[test]
    fn test_value_serde_json() {
        let val = Value::Object({
            let mut map = HashMap::new();
            map.insert("count".to_string(), Value::Number(42.0));
            map.insert("active".to_string(), Value::Bool(true));
            map
        });

        let json = serde_json::to_string(&val).unwrap();
        assert!(json.contains("count"));
        assert!(json.contains("42"));

        let deserialized: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val, deserialized);
    }

    #[test]
    fn test_list_deserializes_from_json_array() {
        let val: Value = serde_json::from_str(r#"["10.0.0.5", "10.0.0.6"]"#).unwrap();
        match val {
            Value::List(items) => assert_eq!(items.len(), 2),
            other => panic!("expected List, got {:?}", other),
        }
    }
}
