use tracing::trace;
use url::Url;

use super::{
    category::Verdict,
    rules::{ClassificationRule, MatchPattern, RuleTable},
};

/// Finds the rule that decides a sample.
///
/// Rules whose primary pattern doesn't match are ignored. The first rule (in table order)
/// whose secondary pattern also matches wins outright. Otherwise the first rule without a
/// secondary pattern wins. A rule whose secondary pattern didn't match is never used as a
/// fallback.
fn select_rule<'a>(
    rules: &'a [ClassificationRule],
    primary_matches: impl Fn(&MatchPattern) -> bool,
    secondary_field: &str,
) -> Option<(usize, &'a ClassificationRule)> {
    let mut primary_only = None;
    for (index, rule) in rules.iter().enumerate() {
        if !primary_matches(&rule.primary) {
            continue;
        }
        match &rule.secondary {
            // Nothing later in the table can outrank this one.
            Some(secondary) if secondary.is_match(secondary_field) => return Some((index, rule)),
            Some(_) => {}
            None => {
                primary_only.get_or_insert((index, rule));
            }
        }
    }
    primary_only
}

/// Matches a process name and its window title against an app table.
pub fn match_app(process_name: &str, window_title: &str, rules: &RuleTable) -> Option<Verdict> {
    let selected = select_rule(
        rules.rules(),
        |pattern| pattern.is_match(process_name),
        window_title,
    );
    trace!(
        "App {process_name:?} {window_title:?} matched rule {:?}",
        selected.map(|(index, _)| index)
    );
    selected.map(|(_, rule)| rule.verdict())
}

/// Matches a domain and the path+query of a url against a url table.
pub fn match_url(domain: &str, path: &str, rules: &RuleTable) -> Option<Verdict> {
    let selected = select_rule(
        rules.rules(),
        |pattern| pattern.matches_domain(domain),
        path,
    );
    trace!(
        "Url {domain:?} {path:?} matched rule {:?}",
        selected.map(|(index, _)| index)
    );
    selected.map(|(_, rule)| rule.verdict())
}

/// Parts of a visited url that url rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// Lower-cased host without a port and without a leading `www.`
    pub domain: String,
    /// Path and query, for example `/search?q=rust`
    pub path: String,
}

impl UrlParts {
    /// Splits a url into the domain and path+query. Monitors sometimes report urls without a
    /// scheme (`github.com/x`), those are treated as http. Returns [None] for things that
    /// have no host, like `about:blank` or `file:///tmp/a`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let url = match Url::parse(raw) {
            Ok(url) if url.has_host() => url,
            Ok(url) if !url.cannot_be_a_base() || raw.contains("://") => return None,
            _ => Url::parse(&format!("http://{raw}")).ok()?,
        };

        let host = url.host_str()?.trim_end_matches('.').to_lowercase();
        let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();
        if domain.is_empty() {
            return None;
        }

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        Some(Self { domain, path })
    }
}
