use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Top-level CLI parser for the `cvl` binary.
#[derive(Debug, Parser)]
#[command(
    name = "cvl",
    version,
    about = "Convolens - analyze chat conversations against the AI Decision Loop rubric"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Archive directory containing conversations.json
    #[arg(long, global = true)]
    pub archive: Option<PathBuf>,

    /// Output directory for report files
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Output format: json, table
    #[arg(short, long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            archive: self.archive.clone(),
            output: self.output.clone(),
            format: self.format,
            quiet: self.quiet,
        }
    }
}

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub archive: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Incrementally analyze every conversation in the archive.
    Run(RunArgs),
    /// Validate report files in place and delete the invalid ones.
    Verify,
    /// Aggregate loop-completion statistics across report files.
    Trends(TrendsArgs),
    /// Export one conversation's raw transcript for debugging.
    Export(ExportArgs),
    /// Merge reports into size-limited bundle documents.
    Bundle(BundleArgs),
    /// Render a daily-activity heatmap from conversation timestamps.
    Heatmap(HeatmapArgs),
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Only analyze conversations created on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub since: Option<NaiveDate>,

    /// Only analyze this single conversation id
    #[arg(long)]
    pub chat_id: Option<String>,

    /// Bundle reports into this many documents after the run
    #[arg(long, value_name = "COUNT")]
    pub bundle: Option<usize>,

    /// Maximum size in MB for each bundle document
    #[arg(long)]
    pub bundle_size_limit: Option<f64>,

    /// Output directory for bundle documents
    #[arg(long)]
    pub bundle_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct TrendsArgs {
    /// Report directory to analyze (defaults to the output directory)
    pub dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    /// Conversation id to export
    pub chat_id: String,

    /// Export format
    #[arg(long, value_enum, default_value = "txt")]
    pub format: ExportFormatArg,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormatArg {
    Json,
    Txt,
}

impl From<ExportFormatArg> for lens_archive::ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Json => Self::Json,
            ExportFormatArg::Txt => Self::Txt,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct BundleArgs {
    /// Target number of bundle documents (advisory; the size limit wins)
    #[arg(long, default_value_t = 10)]
    pub count: usize,

    /// Maximum size in MB for each bundle document
    #[arg(long)]
    pub size_limit_mb: Option<f64>,

    /// Output directory for bundle documents
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct HeatmapArgs {
    /// Output path for the rendered SVG
    #[arg(long, default_value = "activity.svg")]
    pub out: PathBuf,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}', expected YYYY-MM-DD"))
}
