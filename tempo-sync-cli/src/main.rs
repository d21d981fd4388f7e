//! Tempo Sync CLI Application
//!
//! This is the command-line host for the tempo-sync library.
//! It uses the library to:
//! - Format millisecond deltas as relative-time labels
//! - Show how long ago (or until) a timestamp is
//! - Keep a set of configured labels in sync on the terminal

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tempo_sync::{format_relative, Clock, SystemClock};

mod config;
mod report;
mod watch;

use report::ReportFormat;

/// Tempo Sync - keep "time ago" labels in sync with real time
#[derive(Parser, Debug)]
#[command(name = "tempo-sync")]
#[command(about = "Relative-time labels (\"3 hours ago\", \"in 2 days\")", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Format a delta in milliseconds (positive = past, negative = future)
    Format {
        #[arg(value_name = "DELTA_MS", allow_negative_numbers = true)]
        delta_ms: i64,
    },

    /// Show a timestamp relative to now
    Since {
        #[arg(value_name = "TIMESTAMP")]
        timestamp: String,
    },

    /// Keep the labels of a configuration file in sync
    Watch {
        /// Path to configuration file (labels.toml)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Stop after this many refreshes
        #[arg(long, value_name = "COUNT")]
        max_ticks: Option<u64>,

        /// Print JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::debug!("Tempo Sync CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using tempo-sync library v{}", tempo_sync::VERSION);

    match &args.command {
        Command::Format { delta_ms } => {
            println!("{}", format_relative(*delta_ms));
        }
        Command::Since { timestamp } => {
            println!("{}", since(&SystemClock, timestamp)?);
        }
        Command::Watch {
            config,
            max_ticks,
            json,
        } => {
            log::info!("Loading configuration from: {:?}", config);
            let app_config = config::load_config(config)?;
            log::debug!("Configuration loaded: {} label(s)", app_config.labels.len());

            let format = if *json {
                ReportFormat::JsonLines
            } else {
                ReportFormat::Text
            };
            watch::run(&app_config, *max_ticks, format, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}

/// Label for `timestamp` relative to the clock's current instant
fn since<C: Clock>(clock: &C, timestamp: &str) -> Result<String> {
    let origin = tempo_sync::parse_instant(timestamp)
        .with_context(|| format!("Cannot read {:?} as a timestamp", timestamp))?;
    Ok(format_relative(clock.now_ms().saturating_sub(origin)))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
