use std::{fmt::Display, sync::Arc};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;

use super::category::{Category, Verdict};

/// Format version of [RuleTableSpec] understood by this build.
pub const RULE_TABLE_VERSION: u32 = 1;

/// Which field a table is matched against: process names or site domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    App,
    Url,
}

impl Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::App => write!(f, "app"),
            RuleKind::Url => write!(f, "url"),
        }
    }
}

/// Primary pattern of a rule. Both variants are case-insensitive.
#[derive(Debug, Clone)]
pub enum MatchPattern {
    /// Stored lower-cased.
    Exact(Arc<str>),
    Pattern(Regex),
}

impl MatchPattern {
    pub fn exact(value: &str) -> Self {
        Self::Exact(value.to_lowercase().into())
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            MatchPattern::Exact(expected) => value.to_lowercase() == **expected,
            MatchPattern::Pattern(regex) => regex.is_match(value),
        }
    }

    /// Same as [MatchPattern::is_match], except that an exact domain also covers its
    /// subdomains: `github.com` matches `gist.github.com`, but not `notgithub.com`.
    pub fn matches_domain(&self, domain: &str) -> bool {
        match self {
            MatchPattern::Exact(expected) => {
                let domain = domain.to_lowercase();
                domain == **expected
                    || domain
                        .strip_suffix(&**expected)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            MatchPattern::Pattern(regex) => regex.is_match(domain),
        }
    }
}

impl Display for MatchPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPattern::Exact(value) => write!(f, "exact:{value}"),
            MatchPattern::Pattern(regex) => write!(f, "regex:{}", regex.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub primary: MatchPattern,
    /// Matched against the window title for app rules and against path+query for url rules.
    pub secondary: Option<Regex>,
    pub category: Category,
    pub weight: Option<f64>,
}

impl ClassificationRule {
    pub fn verdict(&self) -> Verdict {
        Verdict::new(self.category, self.weight)
    }
}

impl Display for ClassificationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.primary)?;
        if let Some(secondary) = &self.secondary {
            write!(f, " [{}]", secondary.as_str())?;
        }
        write!(f, " -> {} ({})", self.category, self.verdict().weight)
    }
}

/// An ordered, immutable list of rules. Order is part of the table's behavior: the matcher
/// resolves every conflict by position, so tables are never deduplicated or sorted.
/// Cloning is cheap, the rules are shared.
#[derive(Debug, Clone)]
pub struct RuleTable {
    kind: RuleKind,
    version: u32,
    rules: Arc<[ClassificationRule]>,
}

impl RuleTable {
    /// Compiles a table description. Every regular expression is compiled here, so a table
    /// that loaded successfully can never fail during classification.
    pub fn compile(kind: RuleKind, spec: &RuleTableSpec) -> Result<Self, ValidationError> {
        if spec.version != RULE_TABLE_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                table: kind,
                version: spec.version,
            });
        }

        let rules = spec
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| rule.compile(kind, index))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Compiled {} {kind} rules", rules.len());
        Ok(Self {
            kind,
            version: spec.version,
            rules: rules.into(),
        })
    }

    /// Puts `overrides` in front of `base`. Since the first match wins within a priority
    /// tier, user rules shadow the built-in ones they overlap with.
    pub fn layered(overrides: &RuleTable, base: &RuleTable) -> Result<Self, ValidationError> {
        if overrides.kind != base.kind {
            return Err(ValidationError::InvalidParameter {
                name: "rules",
                reason: format!(
                    "can't layer {} rules over {} rules",
                    overrides.kind, base.kind
                ),
            });
        }
        let rules = overrides
            .rules
            .iter()
            .chain(base.rules.iter())
            .cloned()
            .collect::<Vec<_>>();
        Ok(Self {
            kind: base.kind,
            version: base.version,
            rules: rules.into(),
        })
    }

    pub fn builtin_apps() -> Result<Self, ValidationError> {
        Self::compile(RuleKind::App, &super::catalog::app_rules())
    }

    pub fn builtin_urls() -> Result<Self, ValidationError> {
        Self::compile(RuleKind::Url, &super::catalog::url_rules())
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Serialized form of a primary pattern, `{"exact": "slack"}` or `{"regex": "^chrome"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSpec {
    Exact(String),
    Regex(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(rename = "match")]
    pub primary: PatternSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl RuleSpec {
    pub fn exact(value: &str, category: Category) -> Self {
        Self {
            primary: PatternSpec::Exact(value.into()),
            secondary: None,
            category,
            weight: None,
        }
    }

    pub fn regex(pattern: &str, category: Category) -> Self {
        Self {
            primary: PatternSpec::Regex(pattern.into()),
            secondary: None,
            category,
            weight: None,
        }
    }

    pub fn with_secondary(self, pattern: &str) -> Self {
        Self {
            secondary: Some(pattern.into()),
            ..self
        }
    }

    pub fn with_weight(self, weight: f64) -> Self {
        Self {
            weight: Some(weight),
            ..self
        }
    }

    fn compile(
        &self,
        table: RuleKind,
        index: usize,
    ) -> Result<ClassificationRule, ValidationError> {
        let compile_regex = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ValidationError::InvalidPattern {
                    table,
                    index,
                    pattern: pattern.to_string(),
                    source,
                })
        };

        let primary = match &self.primary {
            PatternSpec::Exact(value) => MatchPattern::exact(value),
            PatternSpec::Regex(pattern) => MatchPattern::Pattern(compile_regex(pattern)?),
        };
        let secondary = self.secondary.as_deref().map(compile_regex).transpose()?;

        if let Some(weight) = self.weight {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ValidationError::InvalidWeight {
                    table,
                    index,
                    weight,
                });
            }
        }

        Ok(ClassificationRule {
            primary,
            secondary,
            category: self.category,
            weight: self.weight,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTableSpec {
    #[serde(default = "current_version")]
    pub version: u32,
    pub rules: Vec<RuleSpec>,
}

impl RuleTableSpec {
    pub fn new(rules: Vec<RuleSpec>) -> Self {
        Self {
            version: RULE_TABLE_VERSION,
            rules,
        }
    }
}

fn current_version() -> u32 {
    RULE_TABLE_VERSION
}
