//! Pipeline engine that applies an ordered list of operations to a dataset.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{OperationError, PipelineWarning};
use crate::input::Record;

use super::operations::Operation;
use super::remap::RemapTable;
use super::{calculate, conditional, filter, group, sort};

/// Engine-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Keep zero-valued entries in numeric reductions unless an aggregation
    /// says otherwise.
    pub include_zeros: bool,

    /// Display remaps applied to group values.
    pub remaps: RemapTable,
}

/// Output of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    /// Output field names in first-seen order.
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub row_count: usize,
    /// Skipped stages and formula failures.
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineResult {
    fn new(rows: Vec<Record>, warnings: Vec<PipelineWarning>) -> Self {
        let mut columns: IndexSet<&str> = IndexSet::new();
        for row in &rows {
            columns.extend(row.keys().map(String::as_str));
        }
        let columns = columns.into_iter().map(str::to_string).collect();
        Self {
            columns,
            row_count: rows.len(),
            rows,
            warnings,
        }
    }

    /// Whether any stage was skipped or degraded.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> &[Record] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// Stateless executor for operation pipelines.
#[derive(Debug, Clone, Default)]
pub struct PipelineEngine {
    config: EngineConfig,
}

impl PipelineEngine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom settings.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply `operations` in order to `data`.
    ///
    /// Incomplete stages are skipped with a warning. An unrecognized stage
    /// aborts the run.
    pub fn execute(
        &self,
        data: &[Record],
        operations: &[Operation],
    ) -> Result<PipelineResult, OperationError> {
        let mut rows: Vec<Record> = data.to_vec();
        let mut warnings = Vec::new();

        for (index, operation) in operations.iter().enumerate() {
            if let Some(issue) = operation.config_issue() {
                warn!(stage = index, kind = operation.kind(), "Skipping stage: {}", issue);
                warnings.push(PipelineWarning::config(index, issue));
                continue;
            }

            let before = rows.len();
            rows = match operation {
                Operation::Filter(stage) => filter::apply(stage, rows),
                Operation::GroupBy(stage) => group::apply(stage, &rows, &self.config),
                Operation::Calculate(stage) => calculate::apply(stage, index, rows, &mut warnings),
                Operation::Sort(stage) => sort::apply(stage, rows),
                Operation::Conditional(stage) => {
                    if stage.conditions.len() > 1 {
                        let ignored = stage.conditions.len() - 1;
                        warn!(stage = index, ignored, "Conditional evaluates its first condition only");
                        warnings.push(PipelineWarning::ignored_conditions(index, ignored));
                    }
                    conditional::apply(stage, rows)
                }
                Operation::Unknown => return Err(OperationError::unknown_operation(index)),
            };

            debug!(
                stage = index,
                kind = operation.kind(),
                rows_in = before,
                rows_out = rows.len(),
                "Applied stage"
            );
        }

        Ok(PipelineResult::new(rows, warnings))
    }
}
