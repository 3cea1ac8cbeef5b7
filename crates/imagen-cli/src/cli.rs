//! CLI argument definitions for the `imagen` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use imagen_model::Session;

#[derive(Parser)]
#[command(
    name = "imagen",
    version,
    about = "IMAGEN instrument pipeline: per-session questionnaires to long-format tables",
    long_about = "Load per-session IMAGEN questionnaire exports, normalize subject IDs,\n\
                  derive composite scores and recodes, merge sessions into one table per\n\
                  instrument and annotate it with cohort labels."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub data: DataArgs,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
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
}

/// Where the data lives and which catalogue describes it.
#[derive(Args)]
pub struct DataArgs {
    /// Data root (default: $IMAGEN_DATA_DIR, then the cluster share).
    #[arg(long = "data-root", value_name = "DIR", global = true)]
    pub data_root: Option<PathBuf>,

    /// Release segment of the raw data path.
    #[arg(long = "release", value_name = "VERSION", global = true)]
    pub release: Option<String>,

    /// Instrument catalogue to use instead of the built-in one.
    #[arg(long = "registry", value_name = "TOML", global = true)]
    pub registry: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the instruments and label sets of the catalogue.
    Instruments,

    /// Build instrument tables from the raw session files.
    Build(BuildArgs),

    /// Decode a label set into its label table.
    Labels(LabelsArgs),

    /// Annotate an exported instrument table with an exported label table.
    Annotate(AnnotateArgs),

    /// Descriptive and inference statistics of an exported table.
    Stats(StatsArgs),
}

#[derive(Parser)]
pub struct BuildArgs {
    /// Instruments to build.
    #[arg(value_name = "INSTRUMENT", required_unless_present = "all")]
    pub instruments: Vec<String>,

    /// Build every instrument of the catalogue.
    #[arg(long = "all", conflicts_with = "instruments")]
    pub all: bool,

    /// Annotate each instrument with this label set's exported table.
    #[arg(long = "labels", value_name = "LABELSET")]
    pub labels: Option<String>,

    /// Build and report without writing tables.
    #[arg(long = "no-save")]
    pub no_save: bool,

    /// Write a leading row-index column.
    #[arg(long = "index")]
    pub index: bool,

    /// Write a JSON summary of the batch to this file.
    #[arg(long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[derive(Parser)]
pub struct LabelsArgs {
    /// Label set to decode.
    #[arg(value_name = "LABELSET")]
    pub label_set: String,

    /// Decode and report without writing the label table.
    #[arg(long = "no-save")]
    pub no_save: bool,
}

#[derive(Parser)]
pub struct AnnotateArgs {
    /// Instrument whose exported table is annotated.
    #[arg(value_name = "INSTRUMENT")]
    pub instrument: String,

    /// Label set providing Sex, Site, Class and Dataset.
    #[arg(long = "labels", value_name = "LABELSET")]
    pub labels: String,

    /// Restrict both tables to one session (BL, FU1, FU2, FU3).
    #[arg(long = "session", value_name = "SESSION")]
    pub session: Option<Session>,

    /// Annotate and report without writing the table.
    #[arg(long = "no-save")]
    pub no_save: bool,
}

#[derive(Parser)]
pub struct StatsArgs {
    /// Exported table: a CSV path or a table name under the output directory.
    #[arg(value_name = "TABLE")]
    pub table: String,

    /// Columns to analyse (default: every numeric column except ID).
    #[arg(long = "columns", value_name = "COLUMN", num_args = 1.., value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Grouping column.
    #[arg(long = "group", value_name = "COLUMN", default_value = "Class")]
    pub group: String,

    /// The two group values to compare.
    #[arg(
        long = "compare",
        value_names = ["A", "B"],
        num_args = 2,
        default_values = ["AAM", "HC"]
    )]
    pub compare: Vec<String>,

    /// Categorical column cross-tabulated against the group.
    #[arg(long = "crosstab", value_name = "COLUMN", default_value = "Sex")]
    pub crosstab: String,
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
