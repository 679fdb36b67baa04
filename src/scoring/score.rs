use std::fmt::Display;

use serde::Serialize;

use crate::{classification::ClassifiedSample, error::ValidationError};

use super::{config::ScoringConfig, window::SessionStats};

/// Coarse label derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Tier {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
    Exceptional,
}

impl Tier {
    /// Lower bounds are inclusive.
    pub fn from_composite(composite: f64) -> Self {
        if composite >= 85. {
            Tier::Exceptional
        } else if composite >= 70. {
            Tier::High
        } else if composite >= 50. {
            Tier::Moderate
        } else if composite >= 30. {
            Tier::Low
        } else {
            Tier::VeryLow
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Exceptional => write!(f, "Exceptional"),
            Tier::High => write!(f, "High"),
            Tier::Moderate => write!(f, "Moderate"),
            Tier::Low => write!(f, "Low"),
            Tier::VeryLow => write!(f, "Very Low"),
        }
    }
}

/// Scores of a period, each in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub activity_score: f64,
    pub app_score: f64,
    /// [None] when no sample went through the url override. This is different from 0, which
    /// would mean the visited sites were all unproductive.
    pub url_score: Option<f64>,
    pub focus_score: f64,
    pub composite_score: f64,
    pub tier: Tier,
}

impl ScoreResult {
    /// Result for a period without samples.
    pub fn empty() -> Self {
        Self {
            activity_score: 0.,
            app_score: 0.,
            url_score: None,
            focus_score: 0.,
            composite_score: 0.,
            tier: Tier::VeryLow,
        }
    }

    pub fn from_stats(stats: &SessionStats, config: &ScoringConfig) -> Self {
        if stats.sample_count == 0 {
            return Self::empty();
        }

        let input = stats.total_keystrokes.saturating_add(stats.total_clicks) as f64;
        let activity_score = (input / config.expected_activity_level * 100.).clamp(0., 100.);

        let mean = |sum: f64, count: u32| (count > 0).then(|| 100. * sum / count as f64);
        let app_mean = mean(stats.app_weight_sum, stats.app_samples);
        let url_score = mean(stats.url_weight_sum, stats.url_samples);

        let focus_score = (100.
            - stats.context_switch_count as f64 * config.switch_penalty
            - stats.short_session_count as f64 * config.short_penalty)
            .clamp(0., 100.);

        // A window without url overrides reuses the app score in the url slot, so the
        // weights still add up to 1. The composite is built only from reported fields.
        let app_score = app_mean.unwrap_or(0.);
        let url_term = url_score.unwrap_or(app_score);

        let weights = config.weights;
        let composite_score = (activity_score * weights.activity
            + app_score * weights.app
            + url_term * weights.url
            + focus_score * weights.focus)
            .clamp(0., 100.);

        Self {
            activity_score,
            app_score,
            url_score,
            focus_score,
            composite_score,
            tier: Tier::from_composite(composite_score),
        }
    }
}

/// Recomputes the counters of a sample sequence from scratch, without going through a
/// [SessionWindow](super::window::SessionWindow).
pub fn batch_stats(
    samples: &[ClassifiedSample],
    config: &ScoringConfig,
) -> Result<SessionStats, ValidationError> {
    if let Some(pair) = samples
        .windows(2)
        .find(|pair| pair[1].timestamp_ms() < pair[0].timestamp_ms())
    {
        return Err(ValidationError::OutOfOrder {
            previous_ms: pair[0].timestamp_ms(),
            next_ms: pair[1].timestamp_ms(),
        });
    }

    let mut stats = SessionStats::default();
    for sample in samples {
        stats.add_sample(sample);
    }

    let threshold_ms = config.short_session_threshold_ms();
    let runs = samples
        .chunk_by(|a, b| a.app_name() == b.app_name())
        .collect::<Vec<_>>();
    for pair in runs.windows(2) {
        stats.context_switch_count += 1;
        let duration = pair[1][0].timestamp_ms() - pair[0][0].timestamp_ms();
        if duration < threshold_ms {
            stats.short_session_count += 1;
        }
    }
    Ok(stats)
}
