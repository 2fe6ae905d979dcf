//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rapport: analytical pipeline engine for tabular report data
#[derive(Parser)]
#[command(name = "rapport")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Report configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer the schema of a data file
    Analyze {
        /// Path to the data file (JSON/CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of records to sample
        #[arg(short, long)]
        sample: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a pipeline over a data file
    Run {
        /// Path to the data file (JSON/CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pipeline file (JSON array of operations)
        #[arg(short, long, conflicts_with = "template", required_unless_present = "template")]
        pipeline: Option<PathBuf>,

        /// Name of a saved template
        #[arg(short, long)]
        template: Option<String>,

        /// Write the result to a file instead of printing a table
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format for --output
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Run on the first records only
        #[arg(long)]
        preview: bool,

        /// Template directory
        #[arg(long, default_value = ".rapport/templates")]
        store: PathBuf,
    },

    /// Run one pipeline against two periods
    Compare {
        /// Current period data file
        #[arg(value_name = "CURRENT")]
        current: PathBuf,

        /// Previous period data file
        #[arg(value_name = "PREVIOUS")]
        previous: PathBuf,

        /// Pipeline file (JSON array of operations)
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Period labels, comma separated
        #[arg(long, default_value = "Current,Previous")]
        labels: String,

        /// Measure to compute changes for (default: the primary aggregation)
        #[arg(short, long)]
        measure: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage saved templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,

        /// Template directory
        #[arg(long, global = true, default_value = ".rapport/templates")]
        store: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Save a pipeline file as a named template
    Save {
        /// Template name
        name: String,

        /// Pipeline file (JSON array of operations)
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Report kind the template is recorded for
        #[arg(long)]
        kind: Option<String>,

        /// Recorded period start (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Recorded period end (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },

    /// List saved templates
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a saved template
    Show {
        /// Template name
        name: String,
    },

    /// Delete a saved template
    Delete {
        /// Template name
        name: String,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv, tsv, or json.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Tsv => write!(f, "tsv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
