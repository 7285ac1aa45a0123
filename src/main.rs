mod config;
mod error;
mod export;
mod models;
mod report;
mod stats;
mod storage;
mod tracker;
mod utils;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use export::ExportFormat;
use report::Reporter;
use stats::ReportPeriod;
use std::io::{self, Write};
use std::path::PathBuf;
use storage::Storage;
use tracing_subscriber::EnvFilter;
use tracker::Tracker;

#[derive(Parser)]
#[command(name = "timetracker")]
#[command(about = "Clock in and out of work sessions, track breaks and report worked time", long_about = None)]
struct Cli {
    /// Directory holding sessions.json, config.json and exports
    #[arg(long, global = true, env = "TIMETRACKER_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a work session
    ClockIn {
        /// Task or phase name
        #[arg(short, long)]
        task: Option<String>,
        /// Session notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// End the current session
    ClockOut {
        /// Closing notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Start or end a break
    Break {
        #[arg(value_enum)]
        action: BreakAction,
    },
    /// Show the current session
    Status,
    /// Show sessions of the last days
    Log {
        /// Days to show
        #[arg(short, long, default_value_t = 7)]
        days: i64,
    },
    /// Summarize worked time
    Report {
        /// Since Monday
        #[arg(short, long, conflicts_with_all = ["month", "all"])]
        week: bool,
        /// Since the first of the month
        #[arg(short, long, conflicts_with = "all")]
        month: bool,
        /// All recorded sessions
        #[arg(short, long)]
        all: bool,
    },
    /// Export every session to a file in the data directory
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BreakAction {
    Start,
    End,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let base_dir = Storage::base_dir(cli.data_dir)?;
    let config = config::load_config(&base_dir)?;
    let mut tracker = Tracker::new(Storage::in_dir(&base_dir), config.clone())?;
    let reporter = Reporter::new(config);

    let now = Local::now().naive_local();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::ClockIn { task, notes } => {
            let session = tracker.clock_in(task, notes, now)?;
            reporter.clock_in(&mut out, &session)?;
        }
        Commands::ClockOut { notes } => {
            let result = tracker.clock_out(notes.as_deref(), now)?;
            reporter.clock_out(&mut out, &result)?;
        }
        Commands::Break { action } => match action {
            BreakAction::Start => {
                let session = tracker.start_break(now)?;
                reporter.break_started(&mut out, &session)?;
            }
            BreakAction::End => {
                let session = tracker.end_break(now)?;
                reporter.break_ended(&mut out, &session)?;
            }
        },
        Commands::Status => {
            reporter.status(&mut out, &tracker.db, now)?;
        }
        Commands::Log { days } => {
            reporter.log(&mut out, &tracker.db, days, now)?;
        }
        Commands::Report { week, month, all } => {
            let period = match (week, month, all) {
                (_, true, _) => ReportPeriod::Month,
                (_, _, true) => ReportPeriod::All,
                _ => ReportPeriod::Week,
            };
            reporter.report(&mut out, &tracker.db, period, now)?;
        }
        Commands::Export { format } => {
            let path = export::export(&tracker.db, format, &base_dir, now)?;
            writeln!(out, "Exported to: {}", path.display())?;
        }
    }

    Ok(())
}
