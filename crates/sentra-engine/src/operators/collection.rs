//! Collection membership operators

use super::comparison;
use sentra_core::Value;

/// Membership test against the condition's operand.
///
/// A list operand checks each element; a scalar operand behaves as a
/// single-element list. Element equality follows the same rules as the
/// `equals` operator, including case folding for strings.
pub(super) fn in_list(context_value: &Value, expected: &Value, case_sensitive: bool) -> bool {
    match expected {
        Value::List(items) => items
            .iter()
            .any(|item| comparison::equals(context_value, item, case_sensitive)),
        scalar => comparison::equals(context_value, scalar, case_sensitive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_membership() {
        let list = Value::List(vec![Value::from("a"), Value::from("b")]);
        assert!(in_list(&Value::from("a"), &list, true));
        assert!(!in_list(&Value::from("c"), &list, true));
    }

    #[test]
    fn test_scalar_operand_acts_as_singleton() {
        assert!(in_list(&Value::from("a"), &Value::from("a"), true));
        assert!(!in_list(&Value::from("b"), &Value::from("a"), true));
    }

    #[test]
    fn test_case_folding_in_membership() {
        let list = Value::List(vec![Value::from("POST")]);
        assert!(in_list(&Value::from("post"), &list, false));
        assert!(!in_list(&Value::from("post"), &list, true));
    }

    #[test]
    fn test_numeric_membership() {
        let list = Value::List(vec![Value::from(401i64), Value::from(403i64)]);
        assert!(in_list(&Value::from("403"), &list, true));
        assert!(!in_list(&Value::from(404i64), &list, true));
    }
}
