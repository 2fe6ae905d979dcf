//! Operation model and execution engine.
//!
//! A pipeline is an ordered list of [`Operation`]s. Each stage consumes the
//! table produced by the previous one; the first consumes the raw dataset.

mod calculate;
pub(crate) mod coerce;
mod conditional;
mod engine;
mod filter;
mod group;
mod operations;
mod remap;
mod sort;

pub use coerce::{parse_lenient, parse_timestamp};
pub use engine::{EngineConfig, PipelineEngine, PipelineResult};
pub use group::{
    TOTAL_FIELD, TOTAL_LABEL, UNKNOWN_LABEL, bucket, primary_aggregation, resolve_group_value,
};
pub use operations::{
    AggregationFunction, AggregationSpec, CalculateStage, Condition, ConditionOperator,
    ConditionalStage, FilterOperator, FilterStage, FilterValue, GroupByStage, GroupFieldSpec,
    Operation, SortDirection, SortSpec, SortStage, SortValueType, TimeGranularity,
};
pub use remap::RemapTable;
pub use sort::infer_value_type;
