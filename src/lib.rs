//! Classifies activity samples (foreground app, window title, browser url and input counts)
//! into productive, neutral or unproductive, and scores sessions of them.
//!
//! Classification is done through ordered rule tables, see [classification]. Scores are
//! computed incrementally through [scoring::SessionWindow] or in one go through
//! [scoring::Aggregator::score_batch].
//!

pub mod classification;
pub mod cli;
pub mod config;
pub mod error;
pub mod scoring;
pub mod utils;
