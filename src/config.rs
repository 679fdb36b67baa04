use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    classification::{Classifier, RuleKind, RuleTable, RuleTableSpec},
    scoring::{Aggregator, ScoringConfig},
};

/// User configuration file. Every part is optional, a missing file means defaults.
///
/// ```json
/// {
///   "scoring": { "expected_activity_level": 400 },
///   "app_rules": { "rules": [{ "match": { "exact": "godot" }, "category": "productive" }] },
///   "replace_builtin_rules": false
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_rules: Option<RuleTableSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_rules: Option<RuleTableSpec>,
    /// When set user tables are used on their own. Otherwise they are placed in front of
    /// the built-in catalogs.
    pub replace_builtin_rules: bool,
}

impl AppConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {path:?}");
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Can't read configuration {path:?}"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Can't parse configuration {path:?}"))?;
        Ok(config)
    }

    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path).await,
            None => Ok(Self::default()),
        }
    }

    /// Compiles the effective rule tables.
    pub fn classifier(&self) -> Result<Classifier> {
        let apps = self.table(RuleKind::App, self.app_rules.as_ref())?;
        let urls = self.table(RuleKind::Url, self.url_rules.as_ref())?;
        info!(
            "Using {} app rules and {} url rules",
            apps.len(),
            urls.len()
        );
        Ok(Classifier::new(apps, urls)?)
    }

    pub fn aggregator(&self) -> Result<Aggregator> {
        Ok(Aggregator::new(self.scoring.clone())?)
    }

    fn table(&self, kind: RuleKind, user: Option<&RuleTableSpec>) -> Result<RuleTable> {
        let builtin = || match kind {
            RuleKind::App => RuleTable::builtin_apps(),
            RuleKind::Url => RuleTable::builtin_urls(),
        };
        let table = match user {
            None => builtin()?,
            Some(spec) => {
                let user = RuleTable::compile(kind, spec)
                    .with_context(|| format!("Invalid {kind} rules in configuration"))?;
                if self.replace_builtin_rules {
                    user
                } else {
                    RuleTable::layered(&user, &builtin()?)?
                }
            }
        };
        Ok(table)
    }
}
