// Rollcall CLI - employee ID matching and pay-period compliance reports

mod exit_codes;
mod report;
mod roster;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;
use rollcall_recon::ReconError;

use exit_codes::*;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Match employee names to IDs and reconcile pay-period compliance")]
#[command(version, long_version = long_version())]
struct Cli {
    /// More logging on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign employee IDs to a roster of names
    #[command(after_help = "\
Every roster row gets an Employee ID (exact or fuzzy match against the
reference), a Match Status and a Match Confidence. Rows that already carry
an ID in --id-column keep it.

Examples:
  rollcall match master_names.xlsx --reference employees.csv
  rollcall match names.csv -r employees.xlsx --threshold 90 -o out.xlsx
  rollcall match names.csv -r employees.csv --id-column \"Employee ID\" --json")]
    Match {
        /// Roster to annotate (.csv, .tsv, .xlsx, ...)
        roster: PathBuf,

        /// Reference file with employee names and IDs
        #[arg(long, short = 'r')]
        reference: PathBuf,

        /// Worksheet to read from the roster
        #[arg(long)]
        sheet: Option<String>,

        /// Worksheet to read from the reference
        #[arg(long)]
        reference_sheet: Option<String>,

        /// Minimum similarity (0-100) for a fuzzy match [default: from settings]
        #[arg(long, allow_negative_numbers = true)]
        threshold: Option<i64>,

        /// Roster name column [default: detected]
        #[arg(long)]
        name_column: Option<String>,

        /// Roster column holding IDs that are already known
        #[arg(long)]
        id_column: Option<String>,

        /// Output file (.xlsx, .csv or .tsv) [default: master_names_with_ids_<timestamp>.xlsx]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print match statistics as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Add Employee IDs to a pay-period history file
    #[command(after_help = "\
Left join on normalized name: every history row is kept, in order. The
Employee ID column is inserted after the history name column, followed by
a '<name> Duplicate' column for checking the join by eye.

Examples:
  rollcall merge --history history.xlsx --employees employees.xlsx
  rollcall merge --history history.csv --employees roster.csv -o merged.csv")]
    Merge {
        /// Pay-period history file
        #[arg(long)]
        history: PathBuf,

        /// Employee roster with names and IDs
        #[arg(long)]
        employees: PathBuf,

        #[arg(long)]
        history_sheet: Option<String>,

        #[arg(long)]
        employees_sheet: Option<String>,

        /// Output file (.xlsx, .csv or .tsv) [default: merged_history_<timestamp>.xlsx]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print merge counts as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Reconcile two pay periods and report compliance changes
    #[command(after_help = "\
Writes three workbooks to the output directory:
  matched_report_<ts>.xlsx       Matched_Employees, Improved_Compliance,
                                 Declined_Compliance (+ Possible_Matches)
  unmatched_history_<ts>.xlsx    history rows with no current match
  unmatched_employee_<ts>.xlsx   current rows with no history match

Output directory: --output-dir, else [output] dir in the config, else the
directory from settings.

Examples:
  rollcall report pay-period.recon.toml
  rollcall report pay-period.recon.toml --json > summary.json
  rollcall report pay-period.recon.toml --output-dir ./reports")]
    Report {
        /// Run config (TOML)
        config: PathBuf,

        /// Print the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Where to write the workbooks
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip writing workbooks
        #[arg(long)]
        no_write: bool,
    },

    /// Check a run config without running it
    #[command(after_help = "\
Parses and validates the config, then checks that both input files exist
and carry the configured name and compliance columns.

Examples:
  rollcall validate pay-period.recon.toml")]
    Validate {
        /// Run config (TOML)
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  rollcall-recon ", env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: rollcall <command> [options]");
            eprintln!("       rollcall --help for more information");
            Ok(())
        }
        Some(Commands::Match {
            roster,
            reference,
            sheet,
            reference_sheet,
            threshold,
            name_column,
            id_column,
            output,
            json,
        }) => roster::cmd_match(roster::MatchArgs {
            roster,
            reference,
            sheet,
            reference_sheet,
            threshold,
            name_column,
            id_column,
            output,
            json,
        }),
        Some(Commands::Merge {
            history,
            employees,
            history_sheet,
            employees_sheet,
            output,
            json,
        }) => roster::cmd_merge(history, employees, history_sheet, employees_sheet, output, json),
        Some(Commands::Report { config, json, output_dir, no_write }) => {
            report::cmd_report(config, json, output_dir, no_write)
        }
        Some(Commands::Validate { config }) => report::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Engine error with its registry exit code.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumn { dataset, .. } if dataset == "history" || dataset == "current" => {
                Some(format!("set name_column / compliance_column under [{dataset}] in the run config"))
            }
            ReconError::MissingColumn { .. } => {
                Some("pass the column explicitly (see --help)".to_string())
            }
            ReconError::InvalidThreshold(_) => Some("use a value between 0 and 100".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::recon(err)
    }
}
