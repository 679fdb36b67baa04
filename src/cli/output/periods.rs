use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc};
use clap::ValueEnum;
use futures::{Stream, StreamExt};
use tracing::{instrument, trace, warn};

use crate::{
    classification::ClassifiedSample,
    scoring::{Aggregator, ClosedWindow},
    utils::time::timestamp_to_datetime,
};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeOption {
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Display for TimeOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeOption::Weeks => write!(f, "weeks"),
            TimeOption::Days => write!(f, "days"),
            TimeOption::Hours => write!(f, "hours"),
            TimeOption::Minutes => write!(f, "minutes"),
            TimeOption::Seconds => write!(f, "seconds"),
        }
    }
}

/// Length of a scoring period, for example 15 minutes. Kept as a count plus unit instead of a
/// [Duration] so that periods can be aligned to round times in [clean_time_start].
#[derive(Debug, Clone, Copy)]
pub struct SlidingInterval {
    duration: u32,
    time: TimeOption,
}

impl SlidingInterval {
    pub fn new_opt(duration: u32, time: TimeOption) -> Option<Self> {
        let limit = match time {
            TimeOption::Hours => 24,
            TimeOption::Minutes | TimeOption::Seconds => 60,
            TimeOption::Days => 7,
            TimeOption::Weeks => 2,
        };
        (duration > 0 && duration < limit).then_some(Self { duration, time })
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn time(&self) -> &TimeOption {
        &self.time
    }

    pub fn as_duration(&self) -> Duration {
        let duration = self.duration as i64;
        match self.time {
            TimeOption::Weeks => Duration::weeks(duration),
            TimeOption::Days => Duration::days(duration),
            TimeOption::Hours => Duration::hours(duration),
            TimeOption::Minutes => Duration::minutes(duration),
            TimeOption::Seconds => Duration::seconds(duration),
        }
    }
}

/// Rounds the start of the first period down, so that periods begin at 09:15:00 instead of
/// 09:17:32. Sub-day periods are aligned to multiples of their length since local midnight.
pub fn clean_time_start<Tz: TimeZone>(
    rough_start: DateTime<Tz>,
    scale: &SlidingInterval,
) -> DateTime<Tz> {
    let aligned_time = match scale.time() {
        TimeOption::Weeks | TimeOption::Days => NaiveTime::MIN,
        TimeOption::Hours | TimeOption::Minutes | TimeOption::Seconds => {
            let step = scale.as_duration().num_seconds() as u32;
            let since_midnight = rough_start.time().num_seconds_from_midnight();
            NaiveTime::from_num_seconds_from_midnight_opt(since_midnight - since_midnight % step, 0)
                .unwrap_or(NaiveTime::MIN)
        }
    };

    let day_start = match scale.time() {
        TimeOption::Weeks => {
            rough_start.clone()
                - Duration::days(rough_start.weekday().num_days_from_monday() as i64)
        }
        _ => rough_start.clone(),
    };

    // Daylight saving transitions can make the aligned time ambiguous or missing.
    day_start
        .with_time(aligned_time)
        .earliest()
        .unwrap_or(rough_start)
}

/// Splits a sample stream into consecutive periods of `scale` length and returns a closed
/// window for every period that has samples. Periods never cross a local midnight, the
/// period that would is cut short.
#[instrument(skip(samples, aggregator))]
pub async fn group_into_periods<Tz: TimeZone>(
    samples: impl Stream<Item = Result<ClassifiedSample>>,
    scale: SlidingInterval,
    aggregator: &Aggregator,
) -> Result<Vec<(DateTime<Utc>, ClosedWindow)>>
where
    DateTime<Tz>: From<DateTime<Utc>>,
{
    let mut samples = std::pin::pin!(samples);

    let Some(first) = samples.next().await.transpose()? else {
        return Ok(vec![]);
    };

    let rough_start = DateTime::<Tz>::from(timestamp_to_datetime(first.timestamp_ms())?);
    let mut period_start = clean_time_start(rough_start, &scale).to_utc();

    let duration = scale.as_duration();
    let move_time = |previous_end: DateTime<Utc>| {
        let start = previous_end;
        let mut end = start + duration;
        let local_start = DateTime::<Tz>::from(start);
        let local_end = DateTime::<Tz>::from(end);
        if local_start.date_naive() != local_end.date_naive() {
            if let Some(midnight) = local_end.with_time(NaiveTime::MIN).earliest() {
                end = midnight.to_utc();
            }
        }
        (start, end)
    };
    let (_, mut period_end) = move_time(period_start);

    let mut periods = vec![];
    let mut window = aggregator.window();
    let mut next = Some(first);

    while let Some(sample) = match next.take() {
        Some(v) => Some(v),
        None => samples.next().await.transpose()?,
    } {
        let moment = timestamp_to_datetime(sample.timestamp_ms())?;
        if moment >= period_end {
            if !window.is_empty() {
                periods.push((period_start, window.close()));
                window = aggregator.window();
            }
            // Idle gaps can span many periods, skip over them without allocating anything.
            while moment >= period_end {
                (period_start, period_end) = move_time(period_end);
            }
            trace!("Period {period_start} {period_end}");
        }
        window
            .push(sample)
            .inspect_err(|e| warn!("Rejected sample: {e}"))?;
    }

    if !window.is_empty() {
        periods.push((period_start, window.close()));
    }
    Ok(periods)
}
