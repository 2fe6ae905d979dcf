//! Rapport: analytical pipeline engine for tabular report data.
//!
//! Rapport infers a schema from a sample of records, then runs a
//! user-composed list of operations (filter, group and aggregate, calculate,
//! sort, conditional) over the full dataset to produce a report table.
//!
//! # Core Principles
//!
//! - **Lenient**: Unparsable values coerce to 0 instead of failing a report
//! - **Deterministic**: The same dataset and pipeline always give the same table
//! - **Safe formulas**: Calculate stages use a closed arithmetic grammar
//!
//! # Example
//!
//! ```no_run
//! use rapport::ReportBuilder;
//! use rapport::pipeline::{AggregationFunction, AggregationSpec, GroupByStage, GroupFieldSpec, Operation};
//!
//! let builder = ReportBuilder::new();
//! let (data, _source) = builder.load("claims.json").unwrap();
//!
//! let operations = vec![Operation::GroupBy(GroupByStage::new(
//!     vec![GroupFieldSpec::new("Status")],
//!     vec![AggregationSpec::new("Amount", AggregationFunction::Sum, "Total")],
//! ))];
//!
//! let result = builder.run(&data, &operations).unwrap();
//! println!("Rows: {}", result.row_count);
//! ```

pub mod composer;
pub mod error;
pub mod formula;
pub mod inference;
pub mod input;
pub mod pipeline;
pub mod schema;
pub mod template;

mod rapport;

pub use crate::rapport::{
    ComparisonReport, DEFAULT_PREVIEW_ROWS, PeriodDelta, PeriodResult, ReportBuilder,
    ReportConfig,
};
pub use composer::{ComposeRequest, Composition, OperationComposer, compose};
pub use error::{OperationError, PipelineWarning, RapportError, Result, WarningKind};
pub use inference::{AnalyzerConfig, SchemaAnalyzer};
pub use input::{Dataset, DatasetLoader, Record, SourceMetadata, Value};
pub use pipeline::{EngineConfig, Operation, PipelineEngine, PipelineResult};
pub use schema::{FieldCategory, FieldMetadata, InferredType, Schema};
pub use template::{ReportTemplate, TemplateStore};
