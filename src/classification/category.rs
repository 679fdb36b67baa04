use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Three-way productivity classification of an app or a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Productive,
    Neutral,
    Unproductive,
}

impl Category {
    /// Weight used when a rule doesn't override it.
    pub const fn default_weight(self) -> f64 {
        match self {
            Category::Productive => 1.0,
            Category::Neutral => 0.5,
            Category::Unproductive => 0.0,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Productive => write!(f, "productive"),
            Category::Neutral => write!(f, "neutral"),
            Category::Unproductive => write!(f, "unproductive"),
        }
    }
}

/// Outcome of matching a single rule table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub category: Category,
    pub weight: f64,
}

impl Verdict {
    pub fn new(category: Category, weight: Option<f64>) -> Self {
        Self {
            category,
            weight: weight.unwrap_or_else(|| category.default_weight()),
        }
    }

    /// Applied when neither table has an opinion about a sample.
    pub fn fallback() -> Self {
        Self::new(Category::Neutral, None)
    }
}
