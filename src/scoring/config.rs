use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Share of each signal in the composite score. Must add up to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub activity: f64,
    pub app: f64,
    pub url: f64,
    pub focus: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            activity: 0.25,
            app: 0.25,
            url: 0.20,
            focus: 0.30,
        }
    }
}

impl CompositeWeights {
    pub fn sum(&self) -> f64 {
        self.activity + self.app + self.url + self.focus
    }
}

/// Tunable parameters of the scorer. The defaults are product heuristics meant to be
/// calibrated against real usage, not derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Keystrokes plus clicks that correspond to an activity score of 100.
    pub expected_activity_level: f64,
    /// Focus points lost per context switch.
    pub switch_penalty: f64,
    /// Focus points lost per short session.
    pub short_penalty: f64,
    /// Runs of the same app shorter than this count as short sessions.
    pub short_session_threshold_secs: u64,
    /// Gaps between samples longer than this are treated as idle time by the usage
    /// breakdown.
    pub idle_gap_secs: u64,
    pub weights: CompositeWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            expected_activity_level: 600.0,
            switch_penalty: 2.0,
            short_penalty: 5.0,
            short_session_threshold_secs: 30,
            idle_gap_secs: 60 * 2,
            weights: CompositeWeights::default(),
        }
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |name: &'static str, reason: String| {
            Err(ValidationError::InvalidParameter { name, reason })
        };

        if !(self.expected_activity_level.is_finite() && self.expected_activity_level > 0.) {
            return invalid(
                "expected_activity_level",
                format!("must be positive, got {}", self.expected_activity_level),
            );
        }
        for (name, value) in [
            ("switch_penalty", self.switch_penalty),
            ("short_penalty", self.short_penalty),
        ] {
            if !(value.is_finite() && value >= 0.) {
                return invalid(name, format!("must be non-negative, got {value}"));
            }
        }

        for (name, secs) in [
            ("short_session_threshold_secs", self.short_session_threshold_secs),
            ("idle_gap_secs", self.idle_gap_secs),
        ] {
            if seconds_to_duration(secs).is_none() {
                return invalid(name, format!("{secs} seconds is out of range"));
            }
        }
        if self.idle_gap_secs == 0 {
            return invalid("idle_gap_secs", "must be positive".into());
        }

        let weights = self.weights;
        if [weights.activity, weights.app, weights.url, weights.focus]
            .iter()
            .any(|w| !(w.is_finite() && *w >= 0.))
        {
            return invalid("weights", format!("must be non-negative, got {weights:?}"));
        }
        if (weights.sum() - 1.).abs() > WEIGHT_SUM_TOLERANCE {
            return invalid("weights", format!("must add up to 1, got {}", weights.sum()));
        }
        Ok(())
    }

    pub(crate) fn short_session_threshold_ms(&self) -> u64 {
        self.short_session_threshold_secs.saturating_mul(1000)
    }

    /// Saturates at [Duration::MAX] for values [ScoringConfig::validate] rejects.
    pub fn short_session_threshold(&self) -> Duration {
        seconds_to_duration(self.short_session_threshold_secs).unwrap_or(Duration::MAX)
    }

    /// Saturates at [Duration::MAX] for values [ScoringConfig::validate] rejects.
    pub fn idle_gap(&self) -> Duration {
        seconds_to_duration(self.idle_gap_secs).unwrap_or(Duration::MAX)
    }
}

fn seconds_to_duration(secs: u64) -> Option<Duration> {
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::error::ValidationError;

    use super::{CompositeWeights, ScoringConfig};

    #[test]
    fn default_weights_sum_to_one() {
        assert_eq!(CompositeWeights::default().sum(), 1.0);
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_activity_level() {
        let config = ScoringConfig {
            expected_activity_level: 0.,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidParameter { name: "expected_activity_level", .. })
        ));
    }

    #[test]
    fn rejects_negative_penalty() {
        let config = ScoringConfig {
            short_penalty: -1.,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidParameter { name: "short_penalty", .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_durations() {
        let config = ScoringConfig {
            idle_gap_secs: 10_000_000_000_000_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidParameter { name: "idle_gap_secs", .. })
        ));
        assert_eq!(config.idle_gap(), Duration::MAX);

        let config = ScoringConfig {
            short_session_threshold_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidParameter {
                name: "short_session_threshold_secs",
                ..
            })
        ));

        let config = ScoringConfig {
            idle_gap_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unbalanced_weights() {
        let config = ScoringConfig {
            weights: CompositeWeights {
                focus: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidParameter { name: "weights", .. })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() -> anyhow::Result<()> {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"expected_activity_level": 100, "weights": {"url": 0.2}}"#)?;
        assert_eq!(config.expected_activity_level, 100.);
        assert_eq!(config.switch_penalty, 2.);
        assert_eq!(config.weights, CompositeWeights::default());
        Ok(())
    }
}
