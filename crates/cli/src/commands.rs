//! CLI command definitions for groupscope.
//!
//! Provides the command-line interface for transcript analysis, sample
//! generation and configuration management.

use clap::{Args, Parser, Subcommand, ValueEnum};
use groupscope_core::DateOrder;
use std::path::PathBuf;

/// Main CLI application.
#[derive(Parser, Debug)]
#[command(
    name = "groupscope",
    author,
    version,
    about = "Behavioral profiling of group chat exports",
    long_about = None
)]
pub struct Cli {
    /// Logging verbosity
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "GROUPSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a chat export and report per-user behavior profiles
    Analyze(AnalyzeArgs),

    /// Generate a synthetic chat export
    Sample(SampleArgs),

    /// Print or write the effective configuration
    Config(ConfigArgs),
}

/// Analysis arguments.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Chat export (.txt)
    pub input: PathBuf,

    /// Number of behavior clusters
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    /// Seed for cluster initialisation
    #[arg(long)]
    pub random_state: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report the per-cluster summary instead of per-user rows
    #[arg(long, default_value_t = false)]
    pub summary: bool,

    /// Date order of the export; detected when omitted
    #[arg(long, value_enum)]
    pub date_order: Option<DateOrderArg>,
}

/// Sample generation arguments.
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Destination file
    pub output: PathBuf,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of participants (2-15)
    #[arg(long, default_value_t = 12)]
    pub users: usize,

    /// Number of messages to generate
    #[arg(long, default_value_t = 550)]
    pub messages: usize,
}

/// Configuration arguments.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the configuration here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON document
    Json,
    /// Comma-separated values
    Csv,
}

/// Date order override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DateOrderArg {
    /// DD/MM/YYYY
    Dmy,
    /// MM/DD/YYYY
    Mdy,
    /// YYYY-MM-DD
    Ymd,
}

impl From<DateOrderArg> for DateOrder {
    fn from(arg: DateOrderArg) -> Self {
        match arg {
            DateOrderArg::Dmy => DateOrder::DayMonthYear,
            DateOrderArg::Mdy => DateOrder::MonthDayYear,
            DateOrderArg::Ymd => DateOrder::YearMonthDay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_flags_parse() {
        let cli = Cli::try_parse_from([
            "groupscope",
            "-vv",
            "analyze",
            "chat.txt",
            "-k",
            "3",
            "--random-state",
            "7",
            "--format",
            "csv",
            "--date-order",
            "mdy",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.verbose, 2);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze command");
        };
        assert_eq!(args.input, PathBuf::from("chat.txt"));
        assert_eq!(args.clusters, Some(3));
        assert_eq!(args.random_state, Some(7));
        assert_eq!(args.format, Some(OutputFormat::Csv));
        assert_eq!(args.date_order.map(DateOrder::from), Some(DateOrder::MonthDayYear));
        assert!(!args.summary);
    }

    #[test]
    fn sample_defaults() {
        let cli = Cli::try_parse_from(["groupscope", "sample", "out.txt"])
            .expect("arguments should parse");
        let Commands::Sample(args) = cli.command else {
            panic!("expected sample command");
        };
        assert_eq!(args.seed, 42);
        assert_eq!(args.users, 12);
        assert_eq!(args.messages, 550);
    }
}
