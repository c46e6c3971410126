//! Request context for policy evaluation
//!
//! A `RequestContext` is the field→value view of one inbound request or
//! traffic event, built by the caller's ingestion layer. The engine only
//! reads from it; conditions are pure functions of this context.

use chrono::{DateTime, Utc};
use sentra_core::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context field names.
///
/// Conditions may reference any field the caller supplies; these are the
/// names the built-in templates and common rules use.
pub mod fields {
    pub const SOURCE_IP: &str = "source_ip";
    pub const METHOD: &str = "method";
    pub const PATH: &str = "path";
    pub const QUERY: &str = "query";
    pub const HEADERS: &str = "headers";
    pub const USER_AGENT: &str = "user_agent";
    pub const BODY: &str = "body";
    pub const GEO_COUNTRY: &str = "geo.country";
    pub const GEO_REGION: &str = "geo.region";
    pub const RESPONSE_CODE: &str = "response_code";
}

/// Field→value mapping for one request/traffic event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Caller-assigned request ID, echoed into match records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Service/route this request targets, used for rule target filtering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Extracted request fields
    #[serde(default)]
    pub fields: HashMap<String, Value>,

    /// When the context was built
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self {
            request_id: None,
            target: None,
            fields: HashMap::new(),
            received_at: Utc::now(),
        }
    }

    /// Set the request ID
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Set the service/route target
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Add a field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Insert a field on an existing context
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a field by name.
    ///
    /// Tries an exact key first, then dot-notation descent through nested
    /// objects (`"geo.country"` reads `fields["geo"]["country"]`).
    /// Returns `None` for missing paths; missing fields are a normal
    /// no-match case, never an error.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(name) {
            return Some(value);
        }

        let mut parts = name.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            match current {
                Value::Object(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Whether a non-null value exists for the field
    pub fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }
}
