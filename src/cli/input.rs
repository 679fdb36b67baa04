use std::{future, path::Path};

use anyhow::{Context, Result};
use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, instrument, warn};

use crate::{
    classification::{ActivitySample, ClassifiedSample, Classifier},
    scoring::{Aggregator, SessionWindow},
};

pub type SampleReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Opens a file with samples, or stdin when no path (or `-`) is given.
pub async fn open_input(path: Option<&Path>) -> Result<SampleReader> {
    match path {
        Some(path) if path != Path::new("-") => {
            debug!("Reading samples from {path:?}");
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Can't open {path:?}"))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => {
            debug!("Reading samples from stdin");
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
    }
}

/// Parses JSON lines into samples. Blank lines are skipped, anything else that isn't a valid
/// sample is an error carrying its line number.
pub fn read_samples(
    reader: impl AsyncBufRead + Unpin,
) -> impl Stream<Item = Result<ActivitySample>> {
    LinesStream::new(reader.lines())
        .enumerate()
        .filter_map(|(index, line)| {
            future::ready(match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(
                    serde_json::from_str::<ActivitySample>(&line)
                        .with_context(|| format!("Invalid sample on line {}", index + 1)),
                ),
                Err(e) => Some(Err(e.into())),
            })
        })
}

pub fn classify_stream<'a>(
    samples: impl Stream<Item = Result<ActivitySample>> + 'a,
    classifier: &'a Classifier,
) -> impl Stream<Item = Result<ClassifiedSample>> + 'a {
    samples.map(move |sample| sample.map(|sample| classifier.classify(sample)))
}

/// Feeds a whole stream into a single window.
#[instrument(skip_all)]
pub async fn collect_window(
    samples: impl Stream<Item = Result<ClassifiedSample>>,
    aggregator: &Aggregator,
) -> Result<SessionWindow> {
    let mut samples = std::pin::pin!(samples);
    let mut window = aggregator.window();
    while let Some(sample) = samples.next().await.transpose()? {
        window
            .push(sample)
            .inspect_err(|e| warn!("Rejected sample: {e}"))?;
    }
    debug!("Collected {} samples", window.len());
    Ok(window)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use futures::TryStreamExt;

    use crate::{
        classification::{Category, Classifier},
        scoring::{Aggregator, ScoringConfig},
        utils::logging::TEST_LOGGING,
    };

    use super::{classify_stream, collect_window, read_samples};

    const SAMPLES: &str = r#"{"appName": "code", "windowTitle": "main.rs", "keystrokes": 40, "timestampMs": 0}

{"appName": "firefox", "url": "https://github.com/x", "clicks": 3, "timestampMs": 60000}
"#;

    #[tokio::test]
    async fn reads_json_lines() -> Result<()> {
        *TEST_LOGGING;
        let samples = read_samples(SAMPLES.as_bytes())
            .try_collect::<Vec<_>>()
            .await?;
        assert_eq!(samples.len(), 2);
        assert_eq!(&*samples[1].app_name, "firefox");
        assert_eq!(samples[1].clicks, 3);
        Ok(())
    }

    #[tokio::test]
    async fn reports_bad_line_number() -> Result<()> {
        let input = "{\"appName\": \"code\", \"timestampMs\": 0}\nnot json\n";
        let err = read_samples(input.as_bytes())
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn collects_classified_window() -> Result<()> {
        let classifier = Classifier::builtin()?;
        let aggregator = Aggregator::new(ScoringConfig::default())?;
        let window = collect_window(
            classify_stream(read_samples(SAMPLES.as_bytes()), &classifier),
            &aggregator,
        )
        .await?;
        assert_eq!(window.len(), 2);
        assert!(window
            .samples()
            .iter()
            .all(|v| v.category == Category::Productive));
        assert_eq!(window.stats().context_switch_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn out_of_order_stream_fails() -> Result<()> {
        let input = "{\"appName\": \"code\", \"timestampMs\": 10}\n{\"appName\": \"code\", \"timestampMs\": 5}\n";
        let classifier = Classifier::builtin()?;
        let aggregator = Aggregator::new(ScoringConfig::default())?;
        let result = collect_window(
            classify_stream(read_samples(input.as_bytes()), &classifier),
            &aggregator,
        )
        .await;
        assert!(result.is_err());
        Ok(())
    }
}
