//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the policy engine.
///
/// The defaults are conservative: strict AND matching, no evaluation
/// deadline, and fail-open so that a degraded engine never takes the
/// protected service down with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Confidence threshold applied to rules that do not set their own.
    /// 1.0 requires every condition to match.
    pub default_threshold: f64,

    /// Wall-clock budget for one evaluation; `None` disables the
    /// deadline entirely
    #[serde(with = "duration_millis")]
    pub evaluation_timeout: Option<Duration>,

    /// When the deadline or a cancellation cuts evaluation short:
    /// `true` allows the request, `false` denies it
    pub fail_open: bool,

    /// Thresholds for the rule effectiveness verdict
    pub effectiveness: EffectivenessConfig,

    /// Whether to record evaluation counters and timings
    pub enable_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_threshold: 1.0,
            evaluation_timeout: None,
            fail_open: true,
            effectiveness: EffectivenessConfig::default(),
            enable_metrics: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_threshold(mut self, threshold: f64) -> Self {
        self.default_threshold = threshold;
        self
    }

    pub fn with_evaluation_timeout(mut self, timeout: Duration) -> Self {
        self.evaluation_timeout = Some(timeout);
        self
    }

    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    pub fn with_effectiveness(mut self, effectiveness: EffectivenessConfig) -> Self {
        self.effectiveness = effectiveness;
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }
}

/// Thresholds for judging whether a rule earns its keep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectivenessConfig {
    /// Minimum F1 score for a rule to count as effective
    pub f1_threshold: f64,

    /// Feedback samples required before the verdict is meaningful
    pub min_sample_size: u64,
}

impl Default for EffectivenessConfig {
    fn default() -> Self {
        Self {
            f1_threshold: 0.7,
            min_sample_size: 100,
        }
    }
}

/// Serde adapter for `Option<Duration>` expressed in milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
