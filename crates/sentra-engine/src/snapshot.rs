//! Copy-on-write rule snapshots
//!
//! The engine evaluates against immutable snapshots so that in-flight
//! requests never observe a half-applied rule update. Reloads build a
//! fresh snapshot off to the side and swap it in atomically; readers
//! pin the current snapshot for the duration of one evaluation.

use arc_swap::ArcSwap;
use sentra_core::{Rule, ValidationError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An immutable, validated, compiled set of rules.
///
/// Rules are ordered by priority descending, with rule ID as the
/// deterministic tie-break. Regex and CIDR matchers are compiled once
/// here so evaluation never re-parses patterns.
#[derive(Debug, Default)]
pub struct RuleSnapshot {
    rules: Vec<Rule>,
}

impl RuleSnapshot {
    /// Build a snapshot from a set of candidate rules.
    ///
    /// Invalid rules are rejected individually and reported alongside
    /// the snapshot; valid rules still load. Duplicate rule IDs keep
    /// the last occurrence.
    pub fn build(rules: Vec<Rule>) -> (Self, Vec<ValidationError>) {
        let mut rejected = Vec::new();
        let mut accepted: Vec<Rule> = Vec::with_capacity(rules.len());

        for mut rule in rules {
            if let Err(e) = rule.validate() {
                tracing::warn!(rule_id = %rule.id, "rejecting rule: {}", e);
                rejected.push(e);
                continue;
            }
            if let Err(e) = rule.compile() {
                tracing::warn!(rule_id = %rule.id, "rejecting rule: {}", e);
                rejected.push(e);
                continue;
            }
            if let Some(existing) = accepted.iter_mut().find(|r| r.id == rule.id) {
                *existing = rule;
            } else {
                accepted.push(rule);
            }
        }

        accepted.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.id.cmp(&b.id))
        });

        (Self { rules: accepted }, rejected)
    }

    /// All rules in evaluation order (priority descending)
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up one rule by ID
    pub fn rule(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Atomically swappable holder for the active snapshot.
///
/// `current()` is wait-free for readers; `swap()` publishes a new
/// snapshot and bumps the version counter. Snapshots pinned by
/// in-flight evaluations stay alive until those evaluations drop them.
#[derive(Debug)]
pub struct SnapshotStore {
    snapshot: ArcSwap<RuleSnapshot>,
    version: AtomicU64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(RuleSnapshot::default()),
            version: AtomicU64::new(0),
        }
    }

    /// Pin the current snapshot for one evaluation
    pub fn current(&self) -> Arc<RuleSnapshot> {
        self.snapshot.load_full()
    }

    /// Publish a new snapshot, returning the new version number
    pub fn swap(&self, snapshot: RuleSnapshot) -> u64 {
        self.snapshot.store(Arc::new(snapshot));
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Monotonic version of the active snapshot
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
