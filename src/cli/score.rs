use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use clap::{CommandFactory, Parser};
use serde::Serialize;
use tracing::info;

use crate::{config::AppConfig, scoring::ScoreResult};

use super::{
    input::{classify_stream, collect_window, open_input, read_samples},
    output::{
        periods::{group_into_periods, SlidingInterval, TimeOption},
        score_line,
    },
    Args, InputArgs,
};

#[derive(Debug, Parser)]
pub struct ScoreCommand {
    #[command(flatten)]
    input: InputArgs,
    #[arg(
        short,
        long,
        requires = "option",
        help = "Duration of a scoring period. Combines with option to create periods -d 15 -o minutes"
    )]
    duration: Option<u32>,
    #[arg(
        short,
        long,
        requires = "duration",
        help = "Time option of a scoring period. Combines with duration to create periods -d 15 -o minutes"
    )]
    option: Option<TimeOption>,
    #[arg(long, help = "Align periods to UTC instead of local time")]
    utc: bool,
    #[arg(long, help = "Print results as JSON")]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PeriodScore {
    start: DateTime<Utc>,
    samples: usize,
    #[serde(flatten)]
    score: ScoreResult,
}

/// Command to process `score`. Without a period the whole input is scored as one window,
/// otherwise every period gets its own window and score.
pub async fn process_score_command(
    ScoreCommand {
        input,
        duration,
        option,
        utc,
        json,
    }: ScoreCommand,
    config: &AppConfig,
) -> Result<()> {
    let interval = match (duration, option) {
        (Some(duration), Some(option)) => Some(parse_interval(duration, option)?),
        _ => None,
    };

    let classifier = config.classifier()?;
    let aggregator = config.aggregator()?;
    let reader = open_input(input.input.as_deref()).await?;
    let samples = classify_stream(read_samples(reader), &classifier);

    let Some(interval) = interval else {
        let window = collect_window(samples, &aggregator).await?;
        let result = aggregator.score(&window);
        info!("Scored {} samples: {result:?}", window.len());
        if json {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            println!("{}", score_line(&result));
        }
        return Ok(());
    };

    let periods = if utc {
        group_into_periods::<Utc>(samples, interval, &aggregator).await?
    } else {
        group_into_periods::<Local>(samples, interval, &aggregator).await?
    };

    let show_time = *interval.time() > TimeOption::Days;
    let time_format = if show_time { "%x %H:%M:%S" } else { "%x" };

    for (start, window) in periods {
        let score = aggregator.score(&window);
        if json {
            let period = PeriodScore {
                start,
                samples: window.len(),
                score,
            };
            println!("{}", serde_json::to_string(&period)?);
        } else {
            let start = if utc {
                start.format(time_format).to_string()
            } else {
                start.with_timezone(&Local).format(time_format).to_string()
            };
            println!("{start}\t{}", score_line(&score));
        }
    }
    Ok(())
}

fn parse_interval(duration: u32, option: TimeOption) -> Result<SlidingInterval> {
    SlidingInterval::new_opt(duration, option).ok_or_else(|| {
        Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Can't create an interval using {duration} and {option}"),
            )
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_interval, TimeOption};

    #[test]
    fn interval_limits_are_enforced() {
        assert!(parse_interval(15, TimeOption::Minutes).is_ok());
        assert!(parse_interval(90, TimeOption::Minutes).is_err());
    }
}
