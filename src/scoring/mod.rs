//! Aggregates classified samples into activity, app, url, focus and composite scores.
//!
//! Scoring is incremental: [SessionWindow] keeps running counters so that a score can be
//! recomputed after every new sample without looking at the history again.

pub mod config;
pub mod score;
pub mod window;

pub use config::{CompositeWeights, ScoringConfig};
pub use score::{ScoreResult, Tier};
pub use window::{ClosedWindow, SessionStats, SessionWindow};

use crate::{classification::ClassifiedSample, error::ValidationError};

/// Validated scoring parameters plus the operations that use them.
#[derive(Debug, Clone)]
pub struct Aggregator {
    config: ScoringConfig,
}

impl Aggregator {
    pub fn new(config: ScoringConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Starts an empty window for a new period.
    pub fn window(&self) -> SessionWindow {
        SessionWindow::new(&self.config)
    }

    /// Pushes a sample into a window started by an aggregator with the same short session
    /// threshold. Windows counted with another threshold are rejected.
    pub fn update(
        &self,
        window: SessionWindow,
        sample: ClassifiedSample,
    ) -> Result<SessionWindow, ValidationError> {
        let expected = self.config.short_session_threshold_ms();
        if window.short_session_threshold_ms() != expected {
            return Err(ValidationError::InvalidParameter {
                name: "short_session_threshold_secs",
                reason: format!(
                    "window counts short sessions below {}ms, this aggregator below {expected}ms",
                    window.short_session_threshold_ms()
                ),
            });
        }
        window.update(sample)
    }

    pub fn score(&self, window: &SessionWindow) -> ScoreResult {
        ScoreResult::from_stats(window.stats(), &self.config)
    }

    /// Scores a complete sequence at once. Gives the same result as pushing the samples into
    /// a window one by one.
    pub fn score_batch(
        &self,
        samples: &[ClassifiedSample],
    ) -> Result<ScoreResult, ValidationError> {
        let stats = score::batch_stats(samples, &self.config)?;
        Ok(ScoreResult::from_stats(&stats, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        classification::{
            ActivitySample, Category, ClassificationSource, ClassifiedSample, RuleKind,
            RuleTable, RuleTableSpec, classify, rules::RuleSpec,
        },
        error::ValidationError,
    };

    use super::{Aggregator, ScoreResult, ScoringConfig, Tier};

    fn classified(app: &str, timestamp_ms: u64, weight: f64) -> ClassifiedSample {
        ClassifiedSample {
            sample: ActivitySample::new(app, "", timestamp_ms).with_input(2, 1),
            category: Category::Productive,
            weight,
            source: ClassificationSource::App,
        }
    }

    #[test]
    fn empty_window_scores_zero() -> anyhow::Result<()> {
        let aggregator = Aggregator::new(ScoringConfig::default())?;
        let result = aggregator.score(&aggregator.window());
        assert_eq!(result, ScoreResult::empty());
        assert_eq!(aggregator.score_batch(&[])?, ScoreResult::empty());
        Ok(())
    }

    #[test]
    fn scenario_single_productive_sample() -> anyhow::Result<()> {
        let aggregator = Aggregator::new(ScoringConfig {
            expected_activity_level: 100.,
            ..Default::default()
        })?;
        let mut sample = classified("code", 0, 1.0);
        sample.sample = sample.sample.with_input(0, 0);
        let window = aggregator.update(aggregator.window(), sample)?;
        let result = aggregator.score(&window);
        assert_eq!(result.activity_score, 0.);
        assert_eq!(result.app_score, 100.);
        assert_eq!(result.url_score, None);
        assert_eq!(result.focus_score, 100.);
        assert!((result.composite_score - 75.).abs() < 1e-9);
        assert_eq!(result.tier, Tier::High);
        Ok(())
    }

    #[test]
    fn streaming_matches_batch() -> anyhow::Result<()> {
        let aggregator = Aggregator::new(ScoringConfig::default())?;
        let samples = vec![
            classified("code", 0, 1.0),
            classified("code", 5_000, 1.0),
            classified("slack", 12_000, 0.6),
            classified("code", 20_000, 1.0),
            ClassifiedSample {
                source: ClassificationSource::Url,
                ..classified("chrome", 90_000, 0.0)
            },
            classified("chrome", 95_000, 0.5),
            classified("code", 200_000, 1.0),
        ];

        let mut window = aggregator.window();
        for sample in samples.iter().cloned() {
            window.push(sample)?;
            let streamed = aggregator.score(&window);
            let batch = aggregator.score_batch(window.samples())?;
            assert_eq!(streamed, batch);
        }
        assert_eq!(window.stats().context_switch_count, 4);
        assert_eq!(window.stats().short_session_count, 2);
        Ok(())
    }

    #[test]
    fn batch_rejects_unsorted_samples() -> anyhow::Result<()> {
        let aggregator = Aggregator::new(ScoringConfig::default())?;
        let samples = [classified("code", 10, 1.0), classified("code", 5, 1.0)];
        assert!(matches!(
            aggregator.score_batch(&samples),
            Err(ValidationError::OutOfOrder { .. })
        ));
        Ok(())
    }

    #[test]
    fn update_rejects_window_of_other_threshold() -> anyhow::Result<()> {
        let strict = Aggregator::new(ScoringConfig {
            short_session_threshold_secs: 10,
            ..Default::default()
        })?;
        let aggregator = Aggregator::new(ScoringConfig::default())?;

        let window = strict.update(strict.window(), classified("code", 0, 1.0))?;
        assert!(matches!(
            aggregator.update(window.clone(), classified("slack", 20_000, 1.0)),
            Err(ValidationError::InvalidParameter {
                name: "short_session_threshold_secs",
                ..
            })
        ));
        let window = strict.update(window, classified("slack", 20_000, 1.0))?;
        assert_eq!(window.stats().short_session_count, 0);
        Ok(())
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScoringConfig {
            switch_penalty: f64::NAN,
            ..Default::default()
        };
        assert!(Aggregator::new(config).is_err());
    }

    #[test]
    fn browser_session_uses_url_score() -> anyhow::Result<()> {
        let apps = RuleTable::compile(
            RuleKind::App,
            &RuleTableSpec::new(vec![
                RuleSpec::regex("^chrome", Category::Neutral),
                RuleSpec::exact("code", Category::Productive),
            ]),
        )?;
        let urls = RuleTable::compile(
            RuleKind::Url,
            &RuleTableSpec::new(vec![RuleSpec::exact("github.com", Category::Productive)]),
        )?;
        let aggregator = Aggregator::new(ScoringConfig {
            expected_activity_level: 120.,
            ..Default::default()
        })?;

        let samples = [
            ActivitySample::new("Chrome", "PR", 0)
                .with_url("https://github.com/x")
                .with_input(50, 10),
            ActivitySample::new("Chrome", "news", 60_000).with_url("https://example.org"),
        ];
        let mut window = aggregator.window();
        for sample in samples {
            window.push(classify(sample, &apps, &urls))?;
        }
        let result = aggregator.score(&window);
        assert_eq!(result.url_score, Some(100.));
        assert_eq!(result.app_score, 50.);
        assert_eq!(result.activity_score, 50.);
        assert_eq!(result.focus_score, 100.);
        // 50 * 0.25 + 50 * 0.25 + 100 * 0.2 + 100 * 0.3
        assert!((result.composite_score - 75.).abs() < 1e-9);
        Ok(())
    }
}
