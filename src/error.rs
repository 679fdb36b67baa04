use thiserror::Error;

use crate::classification::rules::RuleKind;

/// Everything the classification and scoring core rejects. A sample that no rule matches is
/// not an error, it becomes neutral.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("sample at {next_ms}ms arrived after a sample at {previous_ms}ms")]
    OutOfOrder { previous_ms: u64, next_ms: u64 },

    #[error("sample field `{field}` is negative ({value})")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("{table} rule #{index} has an invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        table: RuleKind,
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{table} rule #{index} has weight {weight} outside of [0, 1]")]
    InvalidWeight {
        table: RuleKind,
        index: usize,
        weight: f64,
    },

    #[error("{table} rule table version {version} is not supported")]
    UnsupportedVersion { table: RuleKind, version: u32 },

    #[error("parameter `{name}` is invalid: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}
