pub mod breakdown;
pub mod input;
pub mod output;
pub mod score;

use std::path::PathBuf;

use anyhow::Result;
use breakdown::{process_breakdown_command, BreakdownCommand};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use input::{classify_stream, open_input, read_samples};
use score::{process_score_command, ScoreCommand};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::level_filters::LevelFilter;

use crate::{
    config::AppConfig,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Workscore", version, long_about = None)]
#[command(about = "Classifies activity samples and scores productivity", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Print logs to stderr")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Configuration file with scoring parameters and rule tables"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        help = "Directory for log files. By default $XDG_STATE_HOME/workscore/logs or $HOME/.local/state/workscore/logs"
    )]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct InputArgs {
    #[arg(
        help = "File with samples, one JSON object per line. Reads stdin when missing or '-'"
    )]
    pub input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Print every sample with its category as JSON lines")]
    Classify {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Score samples, either as a whole or per period")]
    Score {
        #[command(flatten)]
        command: ScoreCommand,
    },
    #[command(about = "Show time spent per app, site and category")]
    Breakdown {
        #[command(flatten)]
        command: BreakdownCommand,
    },
    #[command(about = "Validate the configuration and list the effective rule tables")]
    Rules,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let log_dir = match args.log_dir {
        Some(dir) => dir,
        None => create_application_default_path()?.join("logs"),
    };
    enable_logging(CLI_PREFIX, &log_dir, logging_level, args.log)?;

    let config = AppConfig::load_or_default(args.config.as_deref()).await?;

    match args.commands {
        Commands::Classify { input } => process_classify_command(input, &config).await,
        Commands::Score { command } => process_score_command(command, &config).await,
        Commands::Breakdown { command } => process_breakdown_command(command, &config).await,
        Commands::Rules => process_rules_command(&config),
    }
}

async fn process_classify_command(input: InputArgs, config: &AppConfig) -> Result<()> {
    let classifier = config.classifier()?;
    let reader = open_input(input.input.as_deref()).await?;
    let mut classified = std::pin::pin!(classify_stream(read_samples(reader), &classifier));

    let mut stdout = BufWriter::new(tokio::io::stdout());
    while let Some(sample) = classified.next().await.transpose()? {
        let mut line = serde_json::to_vec(&sample)?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
    }
    stdout.flush().await?;
    Ok(())
}

fn process_rules_command(config: &AppConfig) -> Result<()> {
    let classifier = config.classifier()?;
    config.aggregator()?;
    for table in [classifier.app_rules(), classifier.url_rules()] {
        for (index, rule) in table.rules().iter().enumerate() {
            println!("{}\t{index}\t{rule}", table.kind());
        }
    }
    Ok(())
}
