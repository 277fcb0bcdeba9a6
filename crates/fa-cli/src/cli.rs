//! CLI argument definitions for the filing assistant.

use std::convert::Infallible;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use fa_header::{DEFAULT_BASE_URL, DEFAULT_HISTORY_FILE, DEFAULT_MODEL};
use fa_store::DEFAULT_STORE_FILE;

#[derive(Parser)]
#[command(
    name = "filing-assistant",
    version,
    about = "Learn which spreadsheet columns get filled in and find them in new tenders",
    long_about = "Learn fillable columns from empty/filled document pairs.\n\n\
                  Training compares both versions of each tender sheet and stores the \
                  columns that were filled. Identification matches a new empty document \
                  against the stored patterns."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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

    /// Allow cell values in debug and trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Learn fillable columns from a folder of empty/filled document pairs.
    Train(TrainArgs),

    /// Identify the columns to fill in a new empty document.
    Identify(IdentifyArgs),

    /// Apply user-provided column labels to a pattern store.
    Update(UpdateArgs),
}

#[derive(Args)]
pub struct TrainArgs {
    /// Folder with training JSON documents.
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: PathBuf,

    /// Pattern store to merge into and save.
    #[arg(long = "store", value_name = "PATH", default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// Only learn this sheet (auto-detects data sheets by default).
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheet: Option<String>,

    /// Ignore any existing store and start from scratch.
    #[arg(long = "fresh")]
    pub fresh: bool,

    #[command(flatten)]
    pub headers: HeaderArgs,
}

#[derive(Args)]
pub struct IdentifyArgs {
    /// Empty JSON document to analyze.
    #[arg(long = "file", value_name = "PATH")]
    pub file: PathBuf,

    /// Pattern store produced by `train`.
    #[arg(long = "store", value_name = "PATH", default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// Sheet to analyze; repeat for several (auto-detects by default).
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheets: Vec<String>,

    /// Confidence threshold for a `fill` decision.
    #[arg(long = "threshold", default_value_t = 0.7)]
    pub threshold: f64,

    /// Write the full report as JSON.
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub headers: HeaderArgs,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Pattern store to update.
    #[arg(long = "store", value_name = "PATH")]
    pub store: PathBuf,

    /// JSON file of `{sheet: {column_labels: {raw: label}}}`.
    #[arg(long = "labels", value_name = "PATH")]
    pub labels: PathBuf,
}

/// Header detection and semantic validator settings.
#[derive(Args, Clone)]
pub struct HeaderArgs {
    /// Use basic header detection only.
    #[arg(long = "no-enhanced-headers")]
    pub no_enhanced_headers: bool,

    /// API key for the chat completions endpoint (falls back to OPENAI_API_KEY).
    #[arg(long = "openai-api-key", env = "FA_OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chat model used for validation and labeling.
    #[arg(long = "openai-model", env = "FA_OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the chat completions API.
    #[arg(long = "openai-base-url", env = "FA_OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Never call the API; use the offline vocabulary verifier.
    #[arg(long = "mock-openai", env = "FA_MOCK_OPENAI", value_parser = parse_mock_switch)]
    pub mock: bool,

    /// Decision history used to learn header indicators.
    #[arg(long = "history", value_name = "PATH", default_value = DEFAULT_HISTORY_FILE)]
    pub history: PathBuf,
}

/// Mock mode is on only for `true`, in any case; other values turn it off.
fn parse_mock_switch(value: &str) -> Result<bool, Infallible> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
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
