//! Sentra Engine
//!
//! Rule evaluation runtime for API security policy: weighted condition
//! matching, deny-wins decisioning, prioritized action instructions,
//! rule templates, and effectiveness tracking. The data model lives in
//! `sentra-core`; this crate owns everything that happens at request
//! time.
//!
//! # Example
//!
//! ```
//! use sentra_core::{Action, ActionType, Condition, ConditionOperator, Rule, RuleType, Value};
//! use sentra_engine::{PolicyEngine, RequestContext};
//!
//! let engine = PolicyEngine::new();
//! engine.load_rules(vec![Rule::new("b1", "Block admin probes", RuleType::Signature)
//!     .with_priority(90)
//!     .add_condition(Condition::new(
//!         "path",
//!         ConditionOperator::StartsWith,
//!         Some(Value::from("/admin")),
//!     ))
//!     .add_action(Action::new(ActionType::Block).with_parameter("duration", Value::from("60s")))]);
//!
//! let decision = engine.evaluate(&RequestContext::new().with_field("path", "/admin/users"));
//! assert!(!decision.allow);
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod metrics;
pub mod operators;
pub mod performance;
pub mod result;
pub mod snapshot;
pub mod template;

pub use config::{EffectivenessConfig, EngineConfig};
pub use context::RequestContext;
pub use engine::{EvaluationOptions, LoadReport, PolicyEngine};
pub use error::{EngineError, EvaluationError, Result};
pub use evaluator::{evaluate_condition, evaluate_rule, RuleEvaluation};
pub use executor::ActionExecutor;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use performance::{FeedbackLabel, PerformanceTracker, RuleMetrics};
pub use result::{ActionResult, ConditionResult, PolicyDecision, RuleMatch, Severity};
pub use snapshot::{RuleSnapshot, SnapshotStore};
pub use template::{builtin_templates, TemplateEngine};
