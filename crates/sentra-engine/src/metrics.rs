//! Engine-level counters and timings

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Monotonic counter
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Sample recorder for evaluation durations.
///
/// Keeps a bounded window of recent samples; once full, the oldest
/// samples are overwritten.
#[derive(Debug)]
pub struct Histogram {
    samples: RwLock<Vec<f64>>,
    cursor: AtomicU64,
    capacity: usize,
}

impl Histogram {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: RwLock::new(Vec::with_capacity(capacity)),
            cursor: AtomicU64::new(0),
            capacity,
        }
    }

    pub fn record(&self, value: f64) {
        let Ok(mut samples) = self.samples.write() else {
            return;
        };
        if samples.len() < self.capacity {
            samples.push(value);
        } else {
            let slot = (self.cursor.fetch_add(1, Ordering::Relaxed) as usize) % self.capacity;
            samples[slot] = value;
        }
    }

    pub fn count(&self) -> usize {
        self.samples.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Mean of the recorded samples, 0.0 when empty
    pub fn mean(&self) -> f64 {
        let Ok(samples) = self.samples.read() else {
            return 0.0;
        };
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Approximate percentile over the sample window, 0.0 when empty
    pub fn percentile(&self, p: f64) -> f64 {
        let Ok(samples) = self.samples.read() else {
            return 0.0;
        };
        if samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let rank = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[rank.min(sorted.len() - 1)]
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Aggregate counters for one engine instance
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Requests evaluated
    pub evaluations: Counter,

    /// Individual rule matches produced
    pub rule_matches: Counter,

    /// Requests that ended in a deny
    pub blocked: Counter,

    /// Evaluations cut short by the deadline or a cancellation
    pub timeouts: Counter,

    /// Evaluation wall time in milliseconds
    pub eval_duration_ms: Histogram,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy for export
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            evaluations: self.evaluations.get(),
            rule_matches: self.rule_matches.get(),
            blocked: self.blocked.get(),
            timeouts: self.timeouts.get(),
            mean_eval_ms: self.eval_duration_ms.mean(),
            p95_eval_ms: self.eval_duration_ms.percentile(95.0),
        }
    }
}

/// Serializable view of [`EngineMetrics`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub evaluations: u64,
    pub rule_matches: u64,
    pub blocked: u64,
    pub timeouts: u64,
    pub mean_eval_ms: f64,
    pub p95_eval_ms: f64,
}
