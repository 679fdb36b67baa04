use tracing::debug;

use crate::error::ValidationError;

use super::{
    category::{Category, Verdict},
    matcher::{match_app, match_url, UrlParts},
    rules::{RuleKind, RuleTable},
    sample::{ActivitySample, ClassificationSource, ClassifiedSample},
};

/// Classifies a sample against an app table and a url table.
///
/// The url table is consulted only when the sample has a url and the app level result is
/// neutral or missing, which is how browsers are recognized. A url match then replaces the
/// app result entirely.
pub fn classify(
    sample: ActivitySample,
    app_rules: &RuleTable,
    url_rules: &RuleTable,
) -> ClassifiedSample {
    let app_verdict = match_app(sample.process_name(), &sample.window_title, app_rules);

    let consult_url = app_verdict.map_or(true, |v| v.category == Category::Neutral);
    let url_verdict = sample
        .url
        .as_deref()
        .filter(|_| consult_url)
        .and_then(UrlParts::parse)
        .and_then(|parts| match_url(&parts.domain, &parts.path, url_rules));

    let (verdict, source) = match (url_verdict, app_verdict) {
        (Some(verdict), _) => (verdict, ClassificationSource::Url),
        (None, Some(verdict)) => (verdict, ClassificationSource::App),
        (None, None) => {
            debug!(
                "No rule matched {:?} {:?}, falling back to neutral",
                sample.app_name, sample.url
            );
            (Verdict::fallback(), ClassificationSource::Default)
        }
    };

    ClassifiedSample {
        sample,
        category: verdict.category,
        weight: verdict.weight,
        source,
    }
}

/// Pair of rule tables that are used together. Holds no other state, so a single instance
/// can classify samples from any number of streams.
#[derive(Debug, Clone)]
pub struct Classifier {
    app_rules: RuleTable,
    url_rules: RuleTable,
}

impl Classifier {
    pub fn new(app_rules: RuleTable, url_rules: RuleTable) -> Result<Self, ValidationError> {
        for (table, expected) in [(&app_rules, RuleKind::App), (&url_rules, RuleKind::Url)] {
            if table.kind() != expected {
                return Err(ValidationError::InvalidParameter {
                    name: "rules",
                    reason: format!("expected {expected} rules, got {} rules", table.kind()),
                });
            }
        }
        Ok(Self {
            app_rules,
            url_rules,
        })
    }

    pub fn builtin() -> Result<Self, ValidationError> {
        Self::new(RuleTable::builtin_apps()?, RuleTable::builtin_urls()?)
    }

    pub fn classify(&self, sample: ActivitySample) -> ClassifiedSample {
        classify(sample, &self.app_rules, &self.url_rules)
    }

    pub fn app_rules(&self) -> &RuleTable {
        &self.app_rules
    }

    pub fn url_rules(&self) -> &RuleTable {
        &self.url_rules
    }
}

#[cfg(test)]
mod tests {
    use crate::classification::{
        category::Category,
        rules::{RuleKind, RuleSpec, RuleTable, RuleTableSpec},
        sample::{ActivitySample, ClassificationSource},
    };

    use super::{classify, Classifier};

    fn tables() -> (RuleTable, RuleTable) {
        let apps = RuleTable::compile(
            RuleKind::App,
            &RuleTableSpec::new(vec![
                RuleSpec::regex("^chrome", Category::Neutral),
                RuleSpec::exact("code", Category::Productive),
                RuleSpec::exact("steam", Category::Unproductive),
            ]),
        )
        .unwrap();
        let urls = RuleTable::compile(
            RuleKind::Url,
            &RuleTableSpec::new(vec![
                RuleSpec::exact("github.com", Category::Productive),
                RuleSpec::exact("reddit.com", Category::Unproductive),
            ]),
        )
        .unwrap();
        (apps, urls)
    }

    #[test]
    fn url_overrides_neutral_browser() {
        let (apps, urls) = tables();
        let sample = ActivitySample::new("Chrome", "x", 0)
            .with_url("https://github.com/x")
            .with_input(50, 10);
        let classified = classify(sample, &apps, &urls);
        assert_eq!(classified.category, Category::Productive);
        assert_eq!(classified.weight, 1.0);
        assert_eq!(classified.source, ClassificationSource::Url);
    }

    #[test]
    fn url_is_ignored_for_decided_apps() {
        let (apps, urls) = tables();
        let sample = ActivitySample::new("/usr/bin/code", "main.rs", 0)
            .with_url("https://reddit.com/r/all");
        let classified = classify(sample, &apps, &urls);
        assert_eq!(classified.category, Category::Productive);
        assert_eq!(classified.source, ClassificationSource::App);
    }

    #[test]
    fn url_is_consulted_for_unknown_apps() {
        let (apps, urls) = tables();
        let sample = ActivitySample::new("qutebrowser", "", 0).with_url("reddit.com/r/all");
        let classified = classify(sample, &apps, &urls);
        assert_eq!(classified.category, Category::Unproductive);
        assert_eq!(classified.source, ClassificationSource::Url);
    }

    #[test]
    fn browser_on_unknown_site_stays_neutral_app() {
        let (apps, urls) = tables();
        let sample = ActivitySample::new("chrome", "", 0).with_url("https://example.org");
        let classified = classify(sample, &apps, &urls);
        assert_eq!(classified.category, Category::Neutral);
        assert_eq!(classified.weight, 0.5);
        assert_eq!(classified.source, ClassificationSource::App);
    }

    #[test]
    fn nothing_matched_falls_back_to_neutral() {
        let (apps, urls) = tables();
        let classified = classify(ActivitySample::new("mystery", "", 0), &apps, &urls);
        assert_eq!(classified.category, Category::Neutral);
        assert_eq!(classified.weight, 0.5);
        assert_eq!(classified.source, ClassificationSource::Default);
    }

    #[test]
    fn classification_is_deterministic() {
        let (apps, urls) = tables();
        let sample = ActivitySample::new("Chrome", "feed", 10).with_url("https://reddit.com/");
        let first = classify(sample.clone(), &apps, &urls);
        let second = classify(sample, &apps, &urls);
        assert_eq!(first, second);
    }

    #[test]
    fn classifier_rejects_swapped_tables() {
        let (apps, urls) = tables();
        assert!(Classifier::new(urls, apps).is_err());
    }
}
