//! Rule effectiveness tracking
//!
//! Accumulates labeled feedback (true/false positives and negatives)
//! per rule and derives precision, recall, F1 and accuracy from it.
//! Feedback arrives from the caller after the fact; the engine only
//! does the bookkeeping.

use crate::config::EffectivenessConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Labeled outcome of one rule decision, judged after the fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLabel {
    /// Rule matched and the traffic was malicious
    TruePositive,
    /// Rule matched but the traffic was benign
    FalsePositive,
    /// Rule did not match and the traffic was benign
    TrueNegative,
    /// Rule did not match but the traffic was malicious
    FalseNegative,
}

#[derive(Debug, Default)]
struct RuleCounters {
    true_positives: AtomicU64,
    false_positives: AtomicU64,
    true_negatives: AtomicU64,
    false_negatives: AtomicU64,
    triggers: AtomicU64,
}

/// Derived effectiveness metrics for one rule.
///
/// Each ratio reports 0.0 when its denominator is zero; too few
/// samples never panics or divides by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMetrics {
    pub rule_id: String,
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
    pub false_negatives: u64,
    pub triggers: u64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,
}

impl RuleMetrics {
    /// Total labeled samples behind these metrics
    pub fn sample_size(&self) -> u64 {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

/// Per-rule feedback accumulator
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    counters: RwLock<HashMap<String, Arc<RuleCounters>>>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one labeled outcome for a rule
    pub fn record_feedback(&self, rule_id: &str, label: FeedbackLabel) {
        let counters = self.counters_for(rule_id);
        let counter = match label {
            FeedbackLabel::TruePositive => &counters.true_positives,
            FeedbackLabel::FalsePositive => &counters.false_positives,
            FeedbackLabel::TrueNegative => &counters.true_negatives,
            FeedbackLabel::FalseNegative => &counters.false_negatives,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a rule matched a request
    pub fn record_trigger(&self, rule_id: &str) {
        self.counters_for(rule_id)
            .triggers
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Derived metrics for one rule, if any feedback or triggers exist
    pub fn metrics(&self, rule_id: &str) -> Option<RuleMetrics> {
        let counters = {
            let map = self.counters.read().ok()?;
            map.get(rule_id)?.clone()
        };

        let tp = counters.true_positives.load(Ordering::Relaxed);
        let fp = counters.false_positives.load(Ordering::Relaxed);
        let tn = counters.true_negatives.load(Ordering::Relaxed);
        let fn_ = counters.false_negatives.load(Ordering::Relaxed);

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let accuracy = ratio(tp + tn, tp + fp + tn + fn_);

        Some(RuleMetrics {
            rule_id: rule_id.to_string(),
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
            triggers: counters.triggers.load(Ordering::Relaxed),
            precision,
            recall,
            f1_score,
            accuracy,
        })
    }

    /// Metrics for every tracked rule
    pub fn all_metrics(&self) -> Vec<RuleMetrics> {
        let ids: Vec<String> = match self.counters.read() {
            Ok(map) => map.keys().cloned().collect(),
            Err(_) => return Vec::new(),
        };
        ids.iter().filter_map(|id| self.metrics(id)).collect()
    }

    /// Whether a rule meets the effectiveness bar: F1 at or above the
    /// configured threshold with enough labeled samples behind it
    pub fn is_effective(&self, rule_id: &str, config: &EffectivenessConfig) -> bool {
        match self.metrics(rule_id) {
            Some(m) => {
                m.sample_size() >= config.min_sample_size && m.f1_score >= config.f1_threshold
            }
            None => false,
        }
    }

    /// Drop accumulated feedback for a rule, e.g. after a rewrite
    pub fn reset(&self, rule_id: &str) {
        if let Ok(mut map) = self.counters.write() {
            map.remove(rule_id);
        }
    }

    fn counters_for(&self, rule_id: &str) -> Arc<RuleCounters> {
        if let Ok(map) = self.counters.read() {
            if let Some(counters) = map.get(rule_id) {
                return counters.clone();
            }
        }
        let mut map = match self.counters.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(rule_id.to_string()).or_default().clone()
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
