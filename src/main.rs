use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_schedule::report::{self, Section};
use transit_schedule::time::parse_service_date;
use transit_schedule::{FeedPaths, ScheduleBuilder, ScheduleConfig, Time};

#[derive(Parser, Debug)]
#[command(
    name = "transit-schedule",
    version,
    about = "Load a GTFS feed restricted to one service date and time window"
)]
struct Args {
    /// Directory holding routes.txt, stops.txt, calendar_dates.txt,
    /// trips.txt, stop_times.txt and transfers.txt
    #[arg(short, long)]
    feed: PathBuf,

    /// Service date, YYYYMMDD or YYYY-MM-DD
    #[arg(short, long, value_parser = parse_date)]
    date: NaiveDate,

    /// Start of the time window (inclusive), H:MM:SS
    #[arg(short, long)]
    start: Time,

    /// End of the time window (exclusive), H:MM:SS
    #[arg(short, long)]
    end: Time,

    /// Listings to print after the summary
    #[arg(long, value_enum)]
    show: Vec<Section>,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_service_date(s)
        .ok()
        .flatten()
        .or_else(|| s.parse::<NaiveDate>().ok())
        .ok_or_else(|| format!("expected a calendar day as YYYYMMDD or YYYY-MM-DD, got {s:?}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = ScheduleConfig::new(args.date, args.start, args.end)?;
    info!(feed = %args.feed.display(), date = %config.date, window = %config.window, "Loading feed");

    let mut builder = ScheduleBuilder::new(config);
    builder
        .load_feed(&FeedPaths::in_dir(&args.feed))
        .with_context(|| format!("failed to load feed from {}", args.feed.display()))?;
    let schedule = builder.finish()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_summary(&mut out, &schedule)?;
    for section in args.show {
        writeln!(out)?;
        report::write_section(&mut out, &schedule, section)?;
    }
    Ok(())
}
