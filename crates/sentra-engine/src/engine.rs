//! The policy engine
//!
//! Ties together the snapshot store, evaluator, action executor,
//! template engine, and effectiveness tracker behind one façade.
//! Evaluation is deny-wins: the highest-priority matching rule with a
//! blocking action fixes the verdict, while lower-priority non-blocking
//! rules still run so their audit actions are not lost.

use crate::config::EngineConfig;
use crate::context::RequestContext;
use crate::error::{EngineError, Result};
use crate::evaluator;
use crate::executor::ActionExecutor;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::performance::{FeedbackLabel, PerformanceTracker, RuleMetrics};
use crate::result::{PolicyDecision, RuleMatch, Severity};
use crate::snapshot::{RuleSnapshot, SnapshotStore};
use crate::template::TemplateEngine;
use chrono::Utc;
use sentra_core::{Rule, ValidationError, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Per-call overrides for one evaluation
#[derive(Debug, Clone, Default)]
pub struct EvaluationOptions {
    /// Overrides the engine-wide evaluation timeout
    pub timeout: Option<Duration>,

    /// Cooperative cancellation flag checked between rules
    pub cancel: Option<Arc<AtomicBool>>,
}

impl EvaluationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Outcome of a lenient rule load
#[derive(Debug)]
pub struct LoadReport {
    /// Rules accepted into the new snapshot
    pub loaded: usize,

    /// Validation failures for the rejected rules
    pub rejected: Vec<ValidationError>,

    /// Version of the snapshot now active
    pub version: u64,
}

/// Rule evaluation engine for API request policy decisions
pub struct PolicyEngine {
    store: SnapshotStore,
    config: EngineConfig,
    executor: ActionExecutor,
    templates: TemplateEngine,
    tracker: PerformanceTracker,
    metrics: EngineMetrics,
}

impl PolicyEngine {
    /// An engine with default configuration and the built-in templates
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            store: SnapshotStore::new(),
            config,
            executor: ActionExecutor::new(),
            templates: TemplateEngine::with_builtins(),
            tracker: PerformanceTracker::new(),
            metrics: EngineMetrics::new(),
        }
    }

    /// Load a rule set, accepting valid rules and rejecting the rest.
    ///
    /// The new snapshot replaces the old one atomically; evaluations
    /// already in flight finish against the snapshot they started with.
    pub fn load_rules(&self, rules: Vec<Rule>) -> LoadReport {
        let (snapshot, rejected) = RuleSnapshot::build(rules);
        let loaded = snapshot.len();
        let version = self.store.swap(snapshot);
        tracing::info!(loaded, rejected = rejected.len(), version, "rule set loaded");
        LoadReport {
            loaded,
            rejected,
            version,
        }
    }

    /// Load a rule set strictly: any invalid rule aborts the load and
    /// the previous snapshot stays active
    pub fn try_load_rules(&self, rules: Vec<Rule>) -> Result<u64> {
        for rule in &rules {
            rule.validate()?;
        }
        let report = self.load_rules(rules);
        if let Some(error) = report.rejected.into_iter().next() {
            // Compilation can still fail on rules that pass validation
            return Err(EngineError::Validation(error));
        }
        Ok(report.version)
    }

    /// The active rule snapshot
    pub fn rules(&self) -> Arc<RuleSnapshot> {
        self.store.current()
    }

    /// Number of rules in the active snapshot
    pub fn rule_count(&self) -> usize {
        self.store.current().len()
    }

    /// Version of the active snapshot
    pub fn snapshot_version(&self) -> u64 {
        self.store.version()
    }

    /// Evaluate one request with the engine-wide options
    pub fn evaluate(&self, context: &RequestContext) -> PolicyDecision {
        self.evaluate_with_options(context, &EvaluationOptions::default())
    }

    /// Evaluate one request.
    ///
    /// Rules run in priority order. Once a blocking rule matches, the
    /// deny verdict is fixed and remaining blocking rules are skipped;
    /// non-blocking rules keep running so their log and alert actions
    /// still appear in the decision. A timeout or cancellation yields a
    /// partial decision resolved by the fail-open setting.
    pub fn evaluate_with_options(
        &self,
        context: &RequestContext,
        options: &EvaluationOptions,
    ) -> PolicyDecision {
        let started = Instant::now();
        let now = Utc::now();
        let snapshot = self.store.current();
        let deadline = options
            .timeout
            .or(self.config.evaluation_timeout)
            .map(|t| started + t);

        let mut matched_rules: Vec<RuleMatch> = Vec::new();
        let mut diagnostics: Vec<String> = Vec::new();
        let mut deny_reason: Option<String> = None;
        let mut partial = false;

        for rule in snapshot.rules() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(rule_id = %rule.id, "evaluation deadline hit");
                partial = true;
                break;
            }
            if options
                .cancel
                .as_ref()
                .is_some_and(|c| c.load(Ordering::Relaxed))
            {
                tracing::debug!("evaluation cancelled");
                partial = true;
                break;
            }

            if !rule.is_active_at(now) {
                continue;
            }
            if !rule.matches_target(context.target.as_deref().unwrap_or("")) {
                continue;
            }
            // A fixed deny cannot be strengthened; only non-blocking
            // rules still add value after it
            if deny_reason.is_some() && rule.has_blocking_action() {
                continue;
            }

            let rule_started = Instant::now();
            let evaluation = evaluator::evaluate_rule(rule, context, self.config.default_threshold);
            diagnostics.extend(evaluation.diagnostics().map(String::from));

            if !evaluation.matched {
                continue;
            }

            let blocking = rule.has_blocking_action();
            let actions = self.executor.execute_rule(rule);
            self.tracker.record_trigger(&rule.id);
            if self.config.enable_metrics {
                self.metrics.rule_matches.increment();
            }
            tracing::debug!(
                rule_id = %rule.id,
                confidence = evaluation.confidence,
                blocking,
                "rule matched"
            );

            if blocking && deny_reason.is_none() {
                deny_reason = Some(format!("blocked by rule '{}' ({})", rule.id, rule.name));
            }

            matched_rules.push(RuleMatch {
                id: Uuid::new_v4().to_string(),
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                request_id: context.request_id.clone(),
                conditions: evaluation.conditions,
                confidence: evaluation.confidence,
                severity: Severity::derive(evaluation.confidence, blocking),
                actions,
                timestamp: now,
                processing_time_us: rule_started.elapsed().as_micros() as u64,
            });
        }

        let allow = match (&deny_reason, partial) {
            (Some(_), _) => false,
            (None, true) => self.config.fail_open,
            (None, false) => true,
        };
        let reason = match deny_reason {
            Some(reason) => reason,
            None if partial && self.config.fail_open => {
                "evaluation incomplete, failing open".to_string()
            }
            None if partial => "evaluation incomplete, failing closed".to_string(),
            None if matched_rules.is_empty() => "no rule matched".to_string(),
            None => "no blocking rule matched".to_string(),
        };

        let actions = matched_rules
            .iter()
            .flat_map(|m| m.actions.iter().cloned())
            .collect();

        let elapsed = started.elapsed();
        if self.config.enable_metrics {
            self.metrics.evaluations.increment();
            if !allow {
                self.metrics.blocked.increment();
            }
            if partial {
                self.metrics.timeouts.increment();
            }
            self.metrics
                .eval_duration_ms
                .record(elapsed.as_secs_f64() * 1000.0);
        }
        tracing::debug!(
            allow,
            matched = matched_rules.len(),
            partial,
            elapsed_us = elapsed.as_micros() as u64,
            "evaluation complete"
        );

        PolicyDecision {
            allow,
            matched_rules,
            actions,
            evaluation_time_ms: elapsed.as_millis() as u64,
            reason,
            partial,
            diagnostics,
        }
    }

    /// Instantiate a registered template into a concrete rule
    pub fn instantiate_template(
        &self,
        template_id: &str,
        rule_id: &str,
        variables: &HashMap<String, Value>,
    ) -> Result<Rule> {
        Ok(self.templates.instantiate(template_id, rule_id, variables)?)
    }

    /// The template registry, for registering custom templates
    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Record one labeled feedback outcome for a rule
    pub fn record_feedback(&self, rule_id: &str, label: FeedbackLabel) {
        self.tracker.record_feedback(rule_id, label);
    }

    /// Effectiveness metrics for one rule
    pub fn rule_metrics(&self, rule_id: &str) -> Option<RuleMetrics> {
        self.tracker.metrics(rule_id)
    }

    /// Whether a rule meets the configured effectiveness bar
    pub fn is_rule_effective(&self, rule_id: &str) -> bool {
        self.tracker.is_effective(rule_id, &self.config.effectiveness)
    }

    /// Effectiveness metrics for every rule with recorded feedback
    pub fn all_rule_metrics(&self) -> Vec<RuleMetrics> {
        self.tracker.all_metrics()
    }

    /// Engine-wide counters and timings
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}
