//! Rule document serialization against realistic JSON

use sentra_core::{ActionType, ConditionOperator, Rule, RuleStatus, RuleType, Value};

const RULE_JSON: &str = r#"{
    "id": "api_scanner_block",
    "name": "Block API scanners",
    "description": "High-confidence scanner fingerprint with elevated error rate",
    "rule_type": "anomaly",
    "priority": 75,
    "threshold": 0.7,
    "conditions": [
        {
            "field": "user_agent",
            "operator": "regex",
            "value": "(?i)(sqlmap|nikto|nuclei|gobuster)",
            "weight": 3.0
        },
        {
            "field": "response_code",
            "operator": "in_range",
            "value": [400, 499],
            "value_type": "number",
            "weight": 1.0
        },
        {
            "field": "geo.country",
            "operator": "in_list",
            "value": ["KP", "IR"],
            "case_sensitive": false,
            "weight": 1.0,
            "negate": true
        }
    ],
    "actions": [
        {
            "type": "block",
            "parameters": { "duration": "3600s" },
            "priority": 1
        },
        {
            "type": "alert",
            "parameters": { "severity": "high" },
            "priority": 2
        }
    ],
    "targets": ["payments-*"],
    "tags": ["scanner", "automated"],
    "is_temporary": false
}"#;

#[test]
fn realistic_rule_document_parses_and_validates() {
    let mut rule: Rule = serde_json::from_str(RULE_JSON).unwrap();

    assert_eq!(rule.id, "api_scanner_block");
    assert_eq!(rule.rule_type, RuleType::Anomaly);
    assert_eq!(rule.status, RuleStatus::Active);
    assert_eq!(rule.threshold, Some(0.7));
    assert_eq!(rule.version, 1);

    assert_eq!(rule.conditions.len(), 3);
    assert_eq!(rule.conditions[0].operator, ConditionOperator::Regex);
    assert_eq!(rule.conditions[0].weight, 3.0);
    assert!(rule.conditions[2].negate);
    assert!(!rule.conditions[2].case_sensitive);

    assert_eq!(rule.actions[0].action_type, ActionType::Block);
    assert_eq!(
        rule.actions[0].parameters.get("duration"),
        Some(&Value::from("3600s"))
    );

    assert!(rule.matches_target("payments-api"));
    assert!(!rule.matches_target("users-api"));

    rule.compile().unwrap();
    assert!(rule.conditions[0].compiled_regex().is_some());
}

#[test]
fn roundtrip_preserves_the_document() {
    let rule: Rule = serde_json::from_str(RULE_JSON).unwrap();
    let json = serde_json::to_string(&rule).unwrap();
    let reparsed: Rule = serde_json::from_str(&json).unwrap();
    assert_eq!(rule, reparsed);
}

#[test]
fn defaults_fill_omitted_fields() {
    let minimal = r#"{
        "id": "m1",
        "name": "Minimal",
        "rule_type": "signature",
        "conditions": [
            { "field": "path", "operator": "contains", "value": "/admin" }
        ],
        "actions": [ { "type": "log" } ]
    }"#;

    let rule: Rule = serde_json::from_str(minimal).unwrap();
    assert_eq!(rule.priority, 0);
    assert_eq!(rule.threshold, None);
    assert_eq!(rule.conditions[0].weight, 1.0);
    assert!(rule.conditions[0].case_sensitive);
    assert!(rule.actions[0].enabled);
    rule.validate().unwrap();
}
