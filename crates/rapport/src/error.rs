//! Error types for the Rapport library.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Rapport operations.
#[derive(Debug, Error)]
pub enum RapportError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a dataset file.
    #[error("Parse error at record {record}: {message}")]
    Parse { record: usize, message: String },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template persistence error.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A template was requested that does not exist in the store.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Fatal pipeline failure.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Rapport operations.
pub type Result<T> = std::result::Result<T, RapportError>;

/// Fatal error raised by the pipeline engine.
///
/// Only an unrecognized stage aborts a pipeline; every other problem is
/// reported as a [`PipelineWarning`] next to a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Stage {stage_index}: {reason}")]
#[serde(rename_all = "camelCase")]
pub struct OperationError {
    /// Zero-based index of the failing stage.
    pub stage_index: usize,
    /// Human-readable reason.
    pub reason: String,
}

impl OperationError {
    pub fn unknown_operation(stage_index: usize) -> Self {
        Self {
            stage_index,
            reason: "unrecognized stage type".to_string(),
        }
    }
}

/// Category of a non-fatal pipeline condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Stage configuration was incomplete; the stage was skipped.
    Config,
    /// A Calculate formula failed to compile or evaluate; result set to 0.
    Formula,
    /// A Conditional stage carried conditions beyond the first.
    IgnoredConditions,
}

/// A non-fatal condition recorded while executing a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineWarning {
    /// Zero-based index of the stage that produced the warning.
    pub stage_index: usize,
    pub kind: WarningKind,
    pub message: String,
    /// Row index for per-row formula failures.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub row: Option<usize>,
}

impl PipelineWarning {
    /// Warning for a skipped stage.
    pub fn config(stage_index: usize, message: impl Into<String>) -> Self {
        Self {
            stage_index,
            kind: WarningKind::Config,
            message: message.into(),
            row: None,
        }
    }

    /// Warning for a formula failure, optionally tied to a row.
    pub fn formula(stage_index: usize, row: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            stage_index,
            kind: WarningKind::Formula,
            message: message.into(),
            row,
        }
    }

    /// Warning for conditions a Conditional stage did not evaluate.
    pub fn ignored_conditions(stage_index: usize, ignored: usize) -> Self {
        Self {
            stage_index,
            kind: WarningKind::IgnoredConditions,
            message: format!(
                "only the first condition is evaluated; {} further condition(s) ignored",
                ignored
            ),
            row: None,
        }
    }
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.row {
            Some(row) => write!(f, "Stage {} (row {}): {}", self.stage_index, row, self.message),
            None => write!(f, "Stage {}: {}", self.stage_index, self.message),
        }
    }
}
