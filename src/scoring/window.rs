use std::{ops::Deref, sync::Arc};

use tracing::trace;

use crate::{classification::ClassifiedSample, error::ValidationError};

use super::config::ScoringConfig;

/// Running counters of a session. Everything the scorer needs is kept here, so scoring never
/// has to look at the samples themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionStats {
    pub sample_count: usize,
    pub total_keystrokes: u64,
    pub total_clicks: u64,
    pub context_switch_count: u32,
    pub short_session_count: u32,
    /// Sum of weights of samples decided by app rules or by the fallback.
    pub app_weight_sum: f64,
    pub app_samples: u32,
    /// Sum of weights of samples decided by the url override.
    pub url_weight_sum: f64,
    pub url_samples: u32,
}

impl SessionStats {
    /// Adds the per-sample part of the counters. Switches and short sessions depend on the
    /// neighbours of a sample and are counted by the caller.
    pub(super) fn add_sample(&mut self, sample: &ClassifiedSample) {
        self.sample_count += 1;
        self.total_keystrokes = self.total_keystrokes.saturating_add(sample.sample.keystrokes);
        self.total_clicks = self.total_clicks.saturating_add(sample.sample.clicks);
        if sample.is_url_override() {
            self.url_weight_sum += sample.weight;
            self.url_samples += 1;
        } else {
            self.app_weight_sum += sample.weight;
            self.app_samples += 1;
        }
    }
}

/// Classified samples of one tracking period, in timestamp order, with their counters.
///
/// A window has a single writer: [SessionWindow::push] takes `&mut self` and
/// [SessionWindow::update] takes the window by value. Once a period is over the window is
/// turned into a [ClosedWindow] that can be shared between readers.
#[derive(Debug, Clone)]
pub struct SessionWindow {
    samples: Vec<ClassifiedSample>,
    stats: SessionStats,
    /// Timestamp of the first sample of the current same-app run.
    run_start_ms: u64,
    short_session_threshold_ms: u64,
}

impl SessionWindow {
    /// Windows are started through [Aggregator::window](super::Aggregator::window), which
    /// uses a validated config.
    pub(crate) fn new(config: &ScoringConfig) -> Self {
        Self {
            samples: vec![],
            stats: SessionStats::default(),
            run_start_ms: 0,
            short_session_threshold_ms: config.short_session_threshold_ms(),
        }
    }

    /// Appends a sample and updates the counters in constant time.
    ///
    /// A context switch is counted whenever the app differs from the previous sample. The
    /// run that the switch ends is a short session if it lasted less than the threshold.
    /// The run that is still going is not judged until it ends.
    pub fn push(&mut self, sample: ClassifiedSample) -> Result<(), ValidationError> {
        match self.samples.last() {
            Some(previous) if sample.timestamp_ms() < previous.timestamp_ms() => {
                return Err(ValidationError::OutOfOrder {
                    previous_ms: previous.timestamp_ms(),
                    next_ms: sample.timestamp_ms(),
                });
            }
            Some(previous) if previous.app_name() != sample.app_name() => {
                self.stats.context_switch_count += 1;
                let run_duration = sample.timestamp_ms() - self.run_start_ms;
                if run_duration < self.short_session_threshold_ms {
                    self.stats.short_session_count += 1;
                }
                trace!(
                    "Switch {} -> {} after {run_duration}ms",
                    previous.app_name(),
                    sample.app_name()
                );
                self.run_start_ms = sample.timestamp_ms();
            }
            Some(_) => {}
            None => self.run_start_ms = sample.timestamp_ms(),
        }

        self.stats.add_sample(&sample);
        self.samples.push(sample);
        Ok(())
    }

    /// Consuming version of [SessionWindow::push].
    pub fn update(mut self, sample: ClassifiedSample) -> Result<Self, ValidationError> {
        self.push(sample)?;
        Ok(self)
    }

    pub fn samples(&self) -> &[ClassifiedSample] {
        &self.samples
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn short_session_threshold_ms(&self) -> u64 {
        self.short_session_threshold_ms
    }

    pub fn first_timestamp_ms(&self) -> Option<u64> {
        self.samples.first().map(ClassifiedSample::timestamp_ms)
    }

    pub fn last_timestamp_ms(&self) -> Option<u64> {
        self.samples.last().map(ClassifiedSample::timestamp_ms)
    }

    /// Ends the period. The result is read-only and cheap to clone.
    pub fn close(self) -> ClosedWindow {
        ClosedWindow(Arc::new(self))
    }
}

/// Immutable snapshot of a finished [SessionWindow].
#[derive(Debug, Clone)]
pub struct ClosedWindow(Arc<SessionWindow>);

impl Deref for ClosedWindow {
    type Target = SessionWindow;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
