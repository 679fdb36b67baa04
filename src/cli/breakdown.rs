use anyhow::Result;
use clap::Parser;

use crate::{
    config::AppConfig,
    utils::{
        percentage::{duration_percentage, Percentage},
        time::format_duration,
    },
};

use super::{
    input::{classify_stream, collect_window, open_input, read_samples},
    output::analysis::{analyze_categories, analyze_usage},
    InputArgs,
};

#[derive(Debug, Parser)]
pub struct BreakdownCommand {
    #[command(flatten)]
    input: InputArgs,
    #[arg(
        short = 'p',
        long = "percentage",
        help = "Filter apps and sites to have at least specified percentage",
        default_value_t = Percentage::new_opt(1.).unwrap()
    )]
    min_percentage: Percentage,
    #[arg(
        short,
        long,
        help = "Only print totals per category instead of every app and site"
    )]
    categories: bool,
}

/// Command to process `breakdown`. Prints where the tracked time went. Time between samples
/// counts towards the earlier sample, up to the idle gap from the scoring configuration.
pub async fn process_breakdown_command(
    BreakdownCommand {
        input,
        min_percentage,
        categories,
    }: BreakdownCommand,
    config: &AppConfig,
) -> Result<()> {
    let classifier = config.classifier()?;
    let aggregator = config.aggregator()?;
    let idle_gap = aggregator.config().idle_gap();

    let reader = open_input(input.input.as_deref()).await?;
    let window = collect_window(
        classify_stream(read_samples(reader), &classifier),
        &aggregator,
    )
    .await?;

    if categories {
        let usage = analyze_categories(window.samples(), idle_gap);
        let total = usage.total();
        for (name, duration) in [
            ("productive", usage.productive),
            ("neutral", usage.neutral),
            ("unproductive", usage.unproductive),
        ] {
            println!(
                "{}%\t{}\t{name}",
                *duration_percentage(duration, total) as i32,
                format_duration(duration),
            );
        }
        return Ok(());
    }

    let (usage, total) = analyze_usage(window.samples(), idle_gap, min_percentage);
    for entry in usage {
        println!(
            "{}%\t{}\t{}\t{}",
            *duration_percentage(entry.duration, total) as i32,
            format_duration(entry.duration),
            entry.category,
            entry.name
        );
    }
    Ok(())
}
