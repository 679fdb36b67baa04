use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::category::Category;

/// One observation of user activity as reported by an activity monitor.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawActivitySample")]
pub struct ActivitySample {
    /// Name of the active process. May be a full path to an executable, for example
    /// /usr/bin/code or C:\Program Files\Slack\slack.exe
    pub app_name: Arc<str>,
    pub window_title: Arc<str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Arc<str>>,
    pub keystrokes: u64,
    pub clicks: u64,
    pub timestamp_ms: u64,
}

impl ActivitySample {
    pub fn new(app_name: &str, window_title: &str, timestamp_ms: u64) -> Self {
        Self {
            app_name: app_name.into(),
            window_title: window_title.into(),
            url: None,
            keystrokes: 0,
            clicks: 0,
            timestamp_ms,
        }
    }

    pub fn with_url(self, url: &str) -> Self {
        Self {
            url: Some(url.into()),
            ..self
        }
    }

    pub fn with_input(self, keystrokes: u64, clicks: u64) -> Self {
        Self {
            keystrokes,
            clicks,
            ..self
        }
    }

    /// Executable name without directories and without a trailing `.exe`, which is what app
    /// rules are written against.
    pub fn process_name(&self) -> &str {
        clean_process_name(&self.app_name)
    }
}

/// Accepts the shape monitors actually send, where counters may come in signed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActivitySample {
    app_name: Arc<str>,
    #[serde(default)]
    window_title: Option<Arc<str>>,
    #[serde(default)]
    url: Option<Arc<str>>,
    #[serde(default)]
    keystrokes: i64,
    #[serde(default)]
    clicks: i64,
    timestamp_ms: u64,
}

impl TryFrom<RawActivitySample> for ActivitySample {
    type Error = ValidationError;

    fn try_from(raw: RawActivitySample) -> Result<Self, Self::Error> {
        let count = |field: &'static str, value: i64| {
            u64::try_from(value).map_err(|_| ValidationError::NegativeCount { field, value })
        };
        Ok(Self {
            keystrokes: count("keystrokes", raw.keystrokes)?,
            clicks: count("clicks", raw.clicks)?,
            app_name: raw.app_name,
            window_title: raw.window_title.unwrap_or_else(|| "".into()),
            url: raw.url.filter(|url| !url.trim().is_empty()),
            timestamp_ms: raw.timestamp_ms,
        })
    }
}

/// How a sample got its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    /// An app rule decided.
    App,
    /// A url rule overrode the app level result.
    Url,
    /// Nothing matched, the neutral fallback was applied.
    Default,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedSample {
    #[serde(flatten)]
    pub sample: ActivitySample,
    pub category: Category,
    pub weight: f64,
    pub source: ClassificationSource,
}

impl ClassifiedSample {
    pub fn timestamp_ms(&self) -> u64 {
        self.sample.timestamp_ms
    }

    pub fn app_name(&self) -> &str {
        &self.sample.app_name
    }

    /// Samples classified through the url override feed the url score, every other sample
    /// feeds the app score.
    pub fn is_url_override(&self) -> bool {
        self.source == ClassificationSource::Url
    }
}

pub fn clean_process_name(value: &str) -> &str {
    // Windows paths are split manually so that they are handled on every platform.
    let file_name = value
        .rsplit(['\\', '/'])
        .next()
        .filter(|v| !v.is_empty())
        .or_else(|| Path::new(value).file_name().and_then(|v| v.to_str()))
        .unwrap_or(value);
    match file_name.len().checked_sub(4) {
        Some(split)
            if file_name.is_char_boundary(split)
                && file_name[split..].eq_ignore_ascii_case(".exe") =>
        {
            &file_name[..split]
        }
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ValidationError;

    use super::{clean_process_name, ActivitySample};

    #[test]
    fn process_names_are_cleaned() {
        assert_eq!(clean_process_name("/usr/share/code/code"), "code");
        assert_eq!(
            clean_process_name(r"C:\Program Files\Slack\slack.EXE"),
            "slack"
        );
        assert_eq!(clean_process_name("Chrome"), "Chrome");
        assert_eq!(clean_process_name(".exe"), "");
    }

    #[test]
    fn sample_parses_from_monitor_json() -> anyhow::Result<()> {
        let sample: ActivitySample = serde_json::from_str(
            r#"{"appName": "Chrome", "windowTitle": "x", "url": "https://github.com/x",
                "keystrokes": 50, "clicks": 10, "timestampMs": 1000}"#,
        )?;
        assert_eq!(
            sample,
            ActivitySample::new("Chrome", "x", 1000)
                .with_url("https://github.com/x")
                .with_input(50, 10)
        );
        Ok(())
    }

    #[test]
    fn missing_optional_fields_default() -> anyhow::Result<()> {
        let sample: ActivitySample =
            serde_json::from_str(r#"{"appName": "code", "url": "", "timestampMs": 5}"#)?;
        assert_eq!(sample, ActivitySample::new("code", "", 5));
        Ok(())
    }

    #[test]
    fn negative_counters_are_rejected() {
        let err = serde_json::from_str::<ActivitySample>(
            r#"{"appName": "code", "keystrokes": -3, "timestampMs": 5}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("keystrokes"), "{err}");

        let raw = super::RawActivitySample {
            app_name: "code".into(),
            window_title: None,
            url: None,
            keystrokes: 0,
            clicks: -1,
            timestamp_ms: 0,
        };
        assert!(matches!(
            ActivitySample::try_from(raw),
            Err(ValidationError::NegativeCount { field: "clicks", value: -1 })
        ));
    }
}
