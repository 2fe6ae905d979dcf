//! Report builder and public API.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OperationError, RapportError, Result};
use crate::inference::{AnalyzerConfig, SchemaAnalyzer};
use crate::input::{Dataset, DatasetLoader, Record, SourceMetadata, field_value};
use crate::pipeline::{
    EngineConfig, Operation, PipelineEngine, PipelineResult, RemapTable, TOTAL_FIELD,
    parse_lenient,
};
use crate::schema::Schema;
use crate::template::ReportTemplate;

/// Default number of records used by [`ReportBuilder::preview`].
pub const DEFAULT_PREVIEW_ROWS: usize = 50;

/// Configuration for report building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    /// Schema inference thresholds.
    pub analyzer: AnalyzerConfig,
    /// Engine defaults and group value remaps.
    pub engine: EngineConfig,
    /// Records used for a live preview.
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            engine: EngineConfig::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl ReportConfig {
    /// Read a configuration from a JSON file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| RapportError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            RapportError::Config(format!("Invalid config '{}': {}", path.display(), e))
        })
    }

    pub fn with_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_include_zeros(mut self, include: bool) -> Self {
        self.engine.include_zeros = include;
        self
    }

    pub fn with_remaps(mut self, remaps: RemapTable) -> Self {
        self.engine.remaps = remaps;
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }
}

/// Result of one period in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodResult {
    pub label: String,
    pub input_records: usize,
    pub result: PipelineResult,
}

/// Change in one measure for one group between two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDelta {
    /// Group labels joined with " / ".
    pub key: String,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    /// Relative change in percent; `None` when the previous value is 0.
    pub change_percent: Option<f64>,
}

/// The same pipeline run against two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub current: PeriodResult,
    pub previous: PeriodResult,
    /// Columns identifying a group in both results.
    pub key_columns: Vec<String>,
}

impl ComparisonReport {
    /// Per-group change of `measure`, outer-joined on the key columns.
    ///
    /// Groups missing from one period count as 0 there. Current-period
    /// groups come first, in result order.
    pub fn deltas(&self, measure: &str) -> Vec<PeriodDelta> {
        let mut joined: IndexMap<String, (f64, f64)> = IndexMap::new();

        for row in &self.current.result.rows {
            joined.entry(self.key_of(row)).or_insert((0.0, 0.0)).0 += measure_value(row, measure);
        }
        for row in &self.previous.result.rows {
            joined.entry(self.key_of(row)).or_insert((0.0, 0.0)).1 += measure_value(row, measure);
        }

        joined
            .into_iter()
            .map(|(key, (current, previous))| PeriodDelta {
                key,
                current,
                previous,
                change: current - previous,
                change_percent: if previous == 0.0 {
                    None
                } else {
                    Some((current - previous) / previous.abs() * 100.0)
                },
            })
            .collect()
    }

    fn key_of(&self, row: &Record) -> String {
        self.key_columns
            .iter()
            .map(|c| field_value(row, c).display())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

fn measure_value(row: &Record, measure: &str) -> f64 {
    parse_lenient(field_value(row, measure)).unwrap_or(0.0)
}

/// Output columns of the last GroupBy stage's keys.
fn key_columns(operations: &[Operation]) -> Vec<String> {
    let Some(stage) = operations.iter().rev().find_map(Operation::as_group_by) else {
        return Vec::new();
    };
    let keys: Vec<String> = stage
        .active_group_fields()
        .map(|g| g.output_name().to_string())
        .collect();
    if keys.is_empty() {
        vec![TOTAL_FIELD.to_string()]
    } else {
        keys
    }
}

/// Combines dataset loading, schema inference and pipeline execution.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    config: ReportConfig,
    analyzer: SchemaAnalyzer,
    engine: PipelineEngine,
}

impl ReportBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::with_config(ReportConfig::default())
    }

    /// Create a builder with custom configuration.
    pub fn with_config(config: ReportConfig) -> Self {
        let analyzer = SchemaAnalyzer::with_config(config.analyzer.clone());
        let engine = PipelineEngine::with_config(config.engine.clone());
        Self {
            config,
            analyzer,
            engine,
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Load a JSON or delimited dataset from disk.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        DatasetLoader::new().load(path)
    }

    /// Infer the schema of a dataset. `None` when it is empty.
    pub fn analyze(&self, data: &[Record]) -> Option<Schema> {
        self.analyzer.analyze(data)
    }

    /// Load a file and infer its schema.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<(SourceMetadata, Schema)> {
        let (data, source) = self.load(path)?;
        let schema = self
            .analyze(&data)
            .ok_or_else(|| RapportError::EmptyData(source.file.clone()))?;
        Ok((source, schema))
    }

    /// Run the pipeline on the first `preview_rows` records.
    pub fn preview(
        &self,
        data: &[Record],
        operations: &[Operation],
    ) -> std::result::Result<PipelineResult, OperationError> {
        let sample = &data[..self.config.preview_rows.min(data.len())];
        debug!(records = sample.len(), stages = operations.len(), "Running preview");
        self.engine.execute(sample, operations)
    }

    /// Run the pipeline on the full dataset.
    pub fn run(
        &self,
        data: &[Record],
        operations: &[Operation],
    ) -> std::result::Result<PipelineResult, OperationError> {
        self.engine.execute(data, operations)
    }

    /// Run a template's operations on the full dataset.
    pub fn run_template(
        &self,
        data: &[Record],
        template: &ReportTemplate,
    ) -> std::result::Result<PipelineResult, OperationError> {
        self.run(data, &template.operations)
    }

    /// Run the same pipeline independently against two labeled periods.
    pub fn compare(
        &self,
        operations: &[Operation],
        current: (&str, &[Record]),
        previous: (&str, &[Record]),
    ) -> std::result::Result<ComparisonReport, OperationError> {
        let run_period = |(label, data): (&str, &[Record])| {
            self.run(data, operations).map(|result| PeriodResult {
                label: label.to_string(),
                input_records: data.len(),
                result,
            })
        };

        Ok(ComparisonReport {
            current: run_period(current)?,
            previous: run_period(previous)?,
            key_columns: key_columns(operations),
        })
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Value, record};
    use crate::pipeline::{AggregationFunction, AggregationSpec, GroupByStage, GroupFieldSpec};

    fn by_status() -> Vec<Operation> {
        vec![Operation::GroupBy(GroupByStage::new(
            vec![GroupFieldSpec::new("Status")],
            vec![AggregationSpec::new("Amount", AggregationFunction::Sum, "Total")],
        ))]
    }

    #[test]
    fn test_preview_uses_first_rows() {
        let data: Vec<Record> = (0..100)
            .map(|i| record([("Status", Value::from("Open")), ("Amount", Value::from(i + 1))]))
            .collect();
        let builder = ReportBuilder::with_config(ReportConfig::default().with_preview_rows(10));
        let preview = builder.preview(&data, &by_status()).unwrap();
        assert_eq!(preview.rows[0]["Total"], Value::Number(55.0));
        let full = builder.run(&data, &by_status()).unwrap();
        assert_eq!(full.rows[0]["Total"], Value::Number(5050.0));
    }

    #[test]
    fn test_compare_deltas() {
        let current = vec![
            record([("Status", Value::from("Open")), ("Amount", Value::from(300))]),
            record([("Status", Value::from("Closed")), ("Amount", Value::from(100))]),
        ];
        let previous = vec![
            record([("Status", Value::from("Open")), ("Amount", Value::from(200))]),
            record([("Status", Value::from("Rejected")), ("Amount", Value::from(50))]),
        ];
        let report = ReportBuilder::new()
            .compare(&by_status(), ("2024", &current), ("2023", &previous))
            .unwrap();
        assert_eq!(report.key_columns, vec!["Status"]);
        assert_eq!(report.current.label, "2024");

        let deltas = report.deltas("Total");
        assert_eq!(deltas.len(), 3);
        assert_eq!(deltas[0].key, "Open");
        assert_eq!(deltas[0].change, 100.0);
        assert_eq!(deltas[0].change_percent, Some(50.0));
        let rejected = deltas.iter().find(|d| d.key == "Rejected").unwrap();
        assert_eq!(rejected.current, 0.0);
        assert_eq!(rejected.change, -50.0);
        let closed = deltas.iter().find(|d| d.key == "Closed").unwrap();
        assert_eq!(closed.change_percent, None);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ReportConfig =
            serde_json::from_str(r#"{"engine": {"includeZeros": true}}"#).unwrap();
        assert!(config.engine.include_zeros);
        assert_eq!(config.preview_rows, DEFAULT_PREVIEW_ROWS);
        assert_eq!(config.analyzer.sample_size, 100);
    }
}
