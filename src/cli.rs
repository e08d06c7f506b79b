use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::error::JobDeckError;

#[derive(Debug, Parser)]
#[command(name = "jobdeck", version, about = "Background job monitor")]
pub struct SystemCli {
    /// Path to the JSON job snapshot written by the job runner
    #[arg(value_name = "FILE", default_value = "jobs.json")]
    pub jobs: PathBuf,
    /// Interval between automatic refreshes, in milliseconds
    #[arg(long = "refresh-ms", default_value_t = 2000)]
    pub refresh_ms: u64,
    /// Retention window applied by `clear-history` without a day count
    #[arg(long = "retention-days", default_value_t = 90)]
    pub retention_days: u32,
    /// Write logs to this file (the terminal is owned by the UI)
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,
}

/// Commands typed into the input line.
#[derive(Debug, Parser)]
#[command(name = "jobdeck", no_binary_name = true, disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Commands {
    Refresh,
    Cancel { id: String },
    /// Cancel every unfinished job of one session
    CancelSession { session_id: String },
    /// Permanently remove one job
    Delete { id: String },
    Show { id: String },
    ClearHistory(ClearHistoryArgs),
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct ClearHistoryArgs {
    /// -1 deletes all finished jobs, 0 applies the retention window, N hides jobs older than N days
    #[arg(allow_negative_numbers = true)]
    pub days: Option<i64>,
}

pub fn parse_line(line: &str) -> Result<Commands, JobDeckError> {
    let tokens = shell_words::split(line).map_err(|err| JobDeckError::InvalidCommand {
        message: err.to_string(),
    })?;

    let parsed = Cli::try_parse_from(tokens).map_err(|err| JobDeckError::InvalidCommand {
        message: err.to_string(),
    })?;
    Ok(parsed.command)
}

pub const HELP_LINES: [&str; 11] = [
    "Commands:",
    "  refresh                 reload the job snapshot",
    "  cancel <id>             cancel an active job",
    "  cancel-session <id>     cancel every unfinished job of a session",
    "  delete <id>             permanently remove a job",
    "  show <id>               open the details of a job",
    "  clear-history [days]    -1 all, 0 retention window, N hide older than N days",
    "  help / quit",
    "Keys:",
    "  ↑/↓ select  Enter details  c cancel  r refresh  : command  q quit",
    "  (in details) ↑/↓ scroll  Esc close",
];
