//! Template instantiation
//!
//! Stamps concrete rules out of registered [`RuleTemplate`]s. A
//! placeholder that is the entire string value substitutes with the
//! variable's typed value; a placeholder embedded in a longer string
//! renders as text. Instantiated rules are validated and compiled
//! before they are handed back, so a bad template never produces a
//! half-usable rule.

use regex::Regex;
use sentra_core::{
    Action, ActionType, Condition, ConditionOperator, Rule, RuleTemplate, RuleType,
    TemplateError, TemplateVariable, Value, VariableType,
};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap())
}

/// Registry and instantiation engine for rule templates
#[derive(Debug, Default)]
pub struct TemplateEngine {
    templates: RwLock<HashMap<String, RuleTemplate>>,
}

impl TemplateEngine {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in attack templates
    pub fn with_builtins() -> Self {
        let engine = Self::new();
        for template in builtin_templates() {
            engine.register(template);
        }
        engine
    }

    /// Register a template, replacing any previous one with the same ID
    pub fn register(&self, template: RuleTemplate) {
        let mut templates = match self.templates.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        templates.insert(template.id.clone(), template);
    }

    /// Look up a registered template
    pub fn get(&self, template_id: &str) -> Option<RuleTemplate> {
        self.templates
            .read()
            .ok()
            .and_then(|t| t.get(template_id).cloned())
    }

    /// IDs of all registered templates, sorted
    pub fn template_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .templates
            .read()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Instantiate a template into a concrete rule.
    ///
    /// Missing required variables and type mismatches fail before any
    /// substitution; the result is validated and compiled.
    pub fn instantiate(
        &self,
        template_id: &str,
        rule_id: &str,
        variables: &HashMap<String, Value>,
    ) -> Result<Rule, TemplateError> {
        let template = self
            .get(template_id)
            .ok_or_else(|| TemplateError::NotFound(template_id.to_string()))?;

        let resolved = resolve_variables(&template, variables)?;

        let mut rule = template.body.clone();
        rule.id = rule_id.to_string();
        rule.name = render_string(&rule.name, &resolved);
        rule.description = rule.description.map(|d| render_string(&d, &resolved));
        for condition in &mut rule.conditions {
            condition.field = render_string(&condition.field, &resolved);
            if let Some(value) = condition.value.take() {
                condition.value = Some(substitute(value, &resolved));
            }
        }
        for action in &mut rule.actions {
            for value in action.parameters.values_mut() {
                *value = substitute(value.clone(), &resolved);
            }
        }

        rule.validate()
            .and_then(|_| rule.compile())
            .map_err(|source| TemplateError::InvalidRule {
                template: template_id.to_string(),
                source,
            })?;

        tracing::debug!(template = template_id, rule_id, "instantiated rule from template");
        Ok(rule)
    }
}

/// Merge supplied variables with declared defaults, enforcing presence
/// and type for each declaration
fn resolve_variables(
    template: &RuleTemplate,
    supplied: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>, TemplateError> {
    let mut resolved = HashMap::with_capacity(template.variables.len());

    for declaration in &template.variables {
        let value = match supplied.get(&declaration.name) {
            Some(value) => value.clone(),
            None => match &declaration.default {
                Some(default) => default.clone(),
                None => {
                    return Err(TemplateError::MissingVariable {
                        template: template.id.clone(),
                        variable: declaration.name.clone(),
                    })
                }
            },
        };

        if !declaration.variable_type.accepts(&value) {
            return Err(TemplateError::WrongType {
                variable: declaration.name.clone(),
                expected: declaration.variable_type.as_str().to_string(),
                actual: value.type_name().to_string(),
            });
        }

        resolved.insert(declaration.name.clone(), value);
    }

    Ok(resolved)
}

/// Substitute placeholders inside one value tree
fn substitute(value: Value, resolved: &HashMap<String, Value>) -> Value {
    match value {
        Value::String(s) => {
            // A string that is exactly one placeholder takes the
            // variable's typed value; anything else renders as text
            if let Some(name) = sole_placeholder(&s) {
                if let Some(replacement) = resolved.get(name) {
                    return replacement.clone();
                }
            }
            Value::String(render_string(&s, resolved))
        }
        Value::List(items) => Value::List(
            items
                .into_iter()
                .map(|item| substitute(item, resolved))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, substitute(v, resolved)))
                .collect(),
        ),
        other => other,
    }
}

/// If `s` consists of exactly one placeholder, return its name
fn sole_placeholder(s: &str) -> Option<&str> {
    let captures = placeholder_pattern().captures(s.trim())?;
    let full = captures.get(0)?;
    if full.as_str().len() == s.trim().len() {
        captures.get(1).map(|m| m.as_str())
    } else {
        None
    }
}

/// Render every known placeholder in `s` as text; unknown placeholders
/// are left untouched
fn render_string(s: &str, resolved: &HashMap<String, Value>) -> String {
    placeholder_pattern()
        .replace_all(s, |captures: &regex::Captures| {
            let name = &captures[1];
            match resolved.get(name).and_then(|v| v.coerce_string()) {
                Some(text) => text,
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

/// Built-in templates for common API attack patterns
pub fn builtin_templates() -> Vec<RuleTemplate> {
    vec![
        sql_injection_template(),
        xss_template(),
        rate_limit_by_ip_template(),
        geo_block_template(),
    ]
}

fn sql_injection_template() -> RuleTemplate {
    let body = Rule::new("sql_injection", "SQL injection on {{target_field}}", RuleType::Signature)
        .with_description("Blocks requests carrying SQL injection payloads")
        .with_priority(90)
        .add_condition(Condition::new(
            "{{target_field}}",
            ConditionOperator::Regex,
            Some(Value::from(
                r"(?i)(union\s+select|select\s+.+\s+from|insert\s+into|drop\s+table|or\s+1\s*=\s*1|--\s|;\s*shutdown)",
            )),
        ))
        .add_action(
            Action::new(ActionType::Block)
                .with_parameter("duration", Value::from("{{block_duration}}")),
        )
        .add_action(
            Action::new(ActionType::Alert)
                .with_parameter("severity", Value::from("critical"))
                .with_priority(1),
        );

    RuleTemplate::new("sql_injection", "SQL injection detection", body)
        .with_description("Regex-based SQL injection detection on a chosen request field")
        .with_variable(TemplateVariable::optional(
            "target_field",
            VariableType::String,
            Value::from("query"),
        ))
        .with_variable(TemplateVariable::optional(
            "block_duration",
            VariableType::String,
            Value::from("600s"),
        ))
}

fn xss_template() -> RuleTemplate {
    let body = Rule::new("xss", "XSS on {{target_field}}", RuleType::Signature)
        .with_description("Flags requests carrying script injection payloads")
        .with_priority(85)
        .add_condition(Condition::new(
            "{{target_field}}",
            ConditionOperator::Regex,
            Some(Value::from(
                r"(?i)(<script\b|javascript:|on(error|load|click)\s*=|<iframe\b)",
            )),
        ))
        .add_action(
            Action::new(ActionType::Alert).with_parameter("severity", Value::from("high")),
        )
        .add_action(Action::new(ActionType::Log).with_priority(2));

    RuleTemplate::new("xss", "Cross-site scripting detection", body)
        .with_description("Regex-based XSS detection on a chosen request field")
        .with_variable(TemplateVariable::optional(
            "target_field",
            VariableType::String,
            Value::from("body"),
        ))
}

fn rate_limit_by_ip_template() -> RuleTemplate {
    let body = Rule::new("rate_limit_by_ip", "Rate limit by source IP", RuleType::RateLimit)
        .with_description("Applies a per-IP request budget")
        .with_priority(40)
        .add_condition(Condition::new("source_ip", ConditionOperator::Exists, None))
        .add_action(
            Action::new(ActionType::RateLimit)
                .with_parameter("limit", Value::from("{{limit}}"))
                .with_parameter("window", Value::from("{{window}}"))
                .with_parameter("key", Value::from("source_ip")),
        );

    RuleTemplate::new("rate_limit_by_ip", "Per-IP rate limit", body)
        .with_description("Per-source-IP rate limiting with a configurable budget")
        .with_variable(TemplateVariable::required("limit", VariableType::Number))
        .with_variable(TemplateVariable::optional(
            "window",
            VariableType::String,
            Value::from("60s"),
        ))
}

fn geo_block_template() -> RuleTemplate {
    let body = Rule::new("geo_block", "Geo block", RuleType::Geo)
        .with_description("Blocks traffic from listed countries")
        .with_priority(70)
        .add_condition(Condition::new(
            "geo.country",
            ConditionOperator::InList,
            Some(Value::from("{{countries}}")),
        ))
        .add_action(
            Action::new(ActionType::Block)
                .with_parameter("duration", Value::from("{{duration}}")),
        );

    RuleTemplate::new("geo_block", "Country block list", body)
        .with_description("Blocks requests whose geo country is on the list")
        .with_variable(TemplateVariable::required("countries", VariableType::List))
        .with_variable(TemplateVariable::optional(
            "duration",
            VariableType::String,
            Value::from("3600s"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(entries: &[(&str, Value)]) -> HashMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_builtins_registered() {
        let engine = TemplateEngine::with_builtins();
        assert_eq!(
            engine.template_ids(),
            vec!["geo_block", "rate_limit_by_ip", "sql_injection", "xss"]
        );
    }

    #[test]
    fn test_unknown_template_errors() {
        let engine = TemplateEngine::with_builtins();
        let result = engine.instantiate("nope", "r1", &HashMap::new());
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_missing_required_variable_errors() {
        let engine = TemplateEngine::with_builtins();
        let result = engine.instantiate("geo_block", "r1", &HashMap::new());
        assert!(matches!(
            result,
            Err(TemplateError::MissingVariable { ref variable, .. }) if variable == "countries"
        ));
    }

    #[test]
    fn test_wrong_variable_type_errors() {
        let engine = TemplateEngine::with_builtins();
        let result = engine.instantiate(
            "geo_block",
            "r1",
            &vars(&[("countries", Value::from("CN"))]),
        );
        assert!(matches!(
            result,
            Err(TemplateError::WrongType { ref expected, .. }) if expected == "list"
        ));
    }

    #[test]
    fn test_sole_placeholder_takes_typed_value() {
        let engine = TemplateEngine::with_builtins();
        let countries = Value::List(vec![Value::from("CN"), Value::from("RU")]);
        let rule = engine
            .instantiate("geo_block", "geo_1", &vars(&[("countries", countries.clone())]))
            .unwrap();

        assert_eq!(rule.id, "geo_1");
        assert_eq!(rule.conditions[0].value, Some(countries));
        // Optional variable filled from its default
        assert_eq!(
            rule.actions[0].parameters.get("duration"),
            Some(&Value::from("3600s"))
        );
    }

    #[test]
    fn test_inline_placeholder_renders_as_text() {
        let engine = TemplateEngine::with_builtins();
        let rule = engine
            .instantiate(
                "sql_injection",
                "sqli_1",
                &vars(&[("target_field", Value::from("body"))]),
            )
            .unwrap();

        assert_eq!(rule.name, "SQL injection on body");
        assert_eq!(rule.conditions[0].field, "body");
    }

    #[test]
    fn test_instantiated_rule_is_compiled() {
        let engine = TemplateEngine::with_builtins();
        let rule = engine
            .instantiate("sql_injection", "sqli_1", &HashMap::new())
            .unwrap();
        assert!(rule.conditions[0].compiled_regex().is_some());
    }

    #[test]
    fn test_number_variable_renders_into_rate_limit() {
        let engine = TemplateEngine::with_builtins();
        let rule = engine
            .instantiate(
                "rate_limit_by_ip",
                "rl_1",
                &vars(&[("limit", Value::from(100i64))]),
            )
            .unwrap();

        assert_eq!(
            rule.actions[0].parameters.get("limit"),
            Some(&Value::from(100i64))
        );
        assert_eq!(
            rule.actions[0].parameters.get("window"),
            Some(&Value::from("60s"))
        );
    }

    #[test]
    fn test_invalid_instantiation_surfaces_validation_error() {
        let engine = TemplateEngine::new();
        // Template whose variable feeds an invalid regex
        let body = Rule::new("bad", "Bad", RuleType::Signature)
            .add_condition(Condition::new(
                "path",
                ConditionOperator::Regex,
                Some(Value::from("{{pattern}}")),
            ))
            .add_action(Action::new(ActionType::Log));
        engine.register(
            RuleTemplate::new("bad", "Bad template", body)
                .with_variable(TemplateVariable::required("pattern", VariableType::String)),
        );

        let result = engine.instantiate(
            "bad",
            "r1",
            &vars(&[("pattern", Value::from("([unclosed"))]),
        );
        assert!(matches!(result, Err(TemplateError::InvalidRule { .. })));
    }
}
