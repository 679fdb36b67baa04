//! Turns raw activity samples into productivity categories.
//!
//! Two ordered [rules::RuleTable]s are involved, one for applications and one for urls.
//! [matcher] picks the deciding rule of a single table and [classifier] combines the two
//! tables into a single [sample::ClassifiedSample].

pub mod catalog;
pub mod category;
pub mod classifier;
pub mod matcher;
pub mod rules;
pub mod sample;

pub use category::{Category, Verdict};
pub use classifier::{classify, Classifier};
pub use matcher::{match_app, match_url, UrlParts};
pub use rules::{ClassificationRule, MatchPattern, RuleKind, RuleTable, RuleTableSpec};
pub use sample::{ActivitySample, ClassificationSource, ClassifiedSample};
