//! Command line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use fontqa_core::{RunOptions, Status};
use log::LevelFilter;

/// Which fonts shall we look at today?
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(about = "check fonts for quality problems")]
pub struct Args {
    /// Log more; repeat for even more. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the checks of a profile on some fonts
    Check(CheckArgs),
    /// List the checks a profile would run
    List {
        /// The profile to list
        #[arg(short, long, default_value = "universal")]
        profile: String,
    },
    /// Create the module skeleton for a new check
    Scaffold(ScaffoldArgs),
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct CheckArgs {
    /// Font files to check
    #[arg(required = true)]
    pub fonts: Vec<PathBuf>,

    /// The profile to run
    #[arg(short, long, default_value = "universal")]
    pub profile: String,

    /// Only run checks whose id contains this. May be repeated.
    #[arg(short = 'c', long = "checkid")]
    pub include_checks: Vec<String>,

    /// Don't run checks whose id contains this. May be repeated.
    #[arg(short = 'x', long = "exclude-checkid")]
    pub exclude_checks: Vec<String>,

    /// A YAML file of per check settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Don't truncate long lists in messages
    #[arg(long)]
    pub full_lists: bool,

    /// Also run checks flagged as experimental
    #[arg(long)]
    pub include_experimental: bool,

    /// Exit with an error code if any check reaches this status
    #[arg(short, long, default_value = "FAIL")]
    pub error_code_on: Status,

    /// Report subresults of at least this status
    #[arg(short = 'l', long, default_value = "WARN")]
    pub loglevel: Status,

    /// Also write the results as JSON to this file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Only print the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Repair what can be repaired, rewriting the font files in place
    #[arg(long)]
    pub hotfix: bool,
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct ScaffoldArgs {
    /// The id of the new check, e.g. opentype/STAT/some_check
    pub check_id: String,

    /// The directory holding the root of the checks module tree
    #[arg(long, default_value = "src/checks")]
    pub root: PathBuf,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub rationale: Option<String>,

    /// A link to where the check was proposed. May be repeated.
    #[arg(long)]
    pub proposal: Vec<String>,
}

impl Args {
    /// The log level implied by -v
    pub fn log_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl CheckArgs {
    /// Selection and settings for the runner; configuration is filled in separately
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            include_checks: self.include_checks.clone(),
            exclude_checks: self.exclude_checks.clone(),
            include_experimental: self.include_experimental,
            full_lists: self.full_lists,
            ..Default::default()
        }
    }
}
