//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use catmig_ingest::SourceFormat;
use catmig_model::ObjectType;
use catmig_report::OutputMode;

#[derive(Parser)]
#[command(
    name = "catmig",
    version,
    about = "Migrate legacy library catalog records into target JSON records",
    long_about = "Map legacy catalog, patron and circulation records onto target \
                  JSON records using tabular mapping rules and reference data.\n\n\
                  Identifiers are derived from legacy ids, so repeated runs produce \
                  the same records."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow record values (patron names, barcodes) in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a migration described by a configuration file.
    Run(RunArgs),

    /// Load a rule file and report problems without migrating anything.
    CheckRules(CheckRulesArgs),

    /// List the supported object types.
    ObjectTypes,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the TOML run configuration.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Source file (overrides `source`).
    #[arg(long = "source", value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// Source layout (overrides `source_format`).
    #[arg(long = "source-format", value_enum)]
    pub source_format: Option<SourceFormatArg>,

    /// Output file for transformed records (overrides `output`).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output line format (overrides `output_mode`).
    #[arg(long = "mode", value_enum)]
    pub mode: Option<OutputModeArg>,

    /// File for records worth retrying (overrides `retry_file`).
    #[arg(long = "retry-file", value_name = "PATH")]
    pub retry_file: Option<PathBuf>,

    /// File for the JSON run report (overrides `report_file`).
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Worker threads (overrides `workers`).
    #[arg(long = "workers", short = 'j')]
    pub workers: Option<usize>,

    /// Stop after this many source records (overrides `max_records`).
    #[arg(long = "max-records", value_name = "N")]
    pub max_records: Option<usize>,

    /// Map, validate and report without writing records or retries.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct CheckRulesArgs {
    /// Rule table (CSV, or TSV by extension).
    #[arg(value_name = "RULES")]
    pub rules: PathBuf,

    /// Object type the rules produce.
    #[arg(long = "object-type", value_name = "TYPE", value_parser = parse_object_type)]
    pub object_type: ObjectType,
}

fn parse_object_type(value: &str) -> Result<ObjectType, String> {
    ObjectType::parse(value).map_err(|error| error.to_string())
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SourceFormatArg {
    Csv,
    Tsv,
    Jsonl,
}

impl From<SourceFormatArg> for SourceFormat {
    fn from(value: SourceFormatArg) -> Self {
        match value {
            SourceFormatArg::Csv => SourceFormat::Csv,
            SourceFormatArg::Tsv => SourceFormat::Tsv,
            SourceFormatArg::Jsonl => SourceFormat::JsonLines,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputModeArg {
    JsonLines,
    BulkLoad,
}

impl From<OutputModeArg> for OutputMode {
    fn from(value: OutputModeArg) -> Self {
        match value {
            OutputModeArg::JsonLines => OutputMode::JsonLines,
            OutputModeArg::BulkLoad => OutputMode::BulkLoad,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
