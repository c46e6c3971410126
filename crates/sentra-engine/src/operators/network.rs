//! Network operators: CIDR ranges and geo-location codes

use crate::error::EvaluationError;
use ipnet::IpNet;
use sentra_core::{Condition, Value};
use std::net::IpAddr;

/// CIDR containment test.
///
/// Uses the CIDR ranges parsed at rule-load time when available; an
/// unparseable context address is a no-match.
pub(super) fn ip_in_range(
    condition: &Condition,
    context_value: &Value,
) -> Result<bool, EvaluationError> {
    let Some(ip) = context_value.as_str().and_then(|s| s.parse::<IpAddr>().ok()) else {
        return Ok(false);
    };

    if let Some(nets) = condition.compiled_cidrs() {
        return Ok(nets.iter().any(|net| net.contains(&ip)));
    }

    // Uncompiled fallback for conditions evaluated outside a snapshot
    let nets = parse_cidrs(condition)?;
    Ok(nets.iter().any(|net| net.contains(&ip)))
}

/// Country/region code match. Codes compare case-insensitively; the
/// operand may be a single code or a list.
pub(super) fn geo_location(context_value: &Value, expected: &Value) -> bool {
    let Some(code) = context_value.as_str() else {
        return false;
    };

    match expected {
        Value::String(s) => s.eq_ignore_ascii_case(code),
        Value::List(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .any(|s| s.eq_ignore_ascii_case(code)),
        _ => false,
    }
}

fn parse_cidrs(condition: &Condition) -> Result<Vec<IpNet>, EvaluationError> {
    let invalid = |reason: String| EvaluationError::InvalidOperand {
        field: condition.field.clone(),
        reason,
    };

    let ranges: Vec<&str> = match condition.value.as_ref() {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::List(items)) => items.iter().filter_map(|v| v.as_str()).collect(),
        _ => return Err(invalid("ip_in_range requires a CIDR string or list".to_string())),
    };

    ranges
        .iter()
        .map(|range| {
            range
                .parse::<IpNet>()
                .or_else(|_| range.parse::<IpAddr>().map(IpNet::from))
                .map_err(|e| invalid(format!("invalid CIDR '{}': {}", range, e)))
        })
        .collect()
}
