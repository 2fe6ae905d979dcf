//! Schema inference.

mod analyzer;

pub use analyzer::{AnalyzerConfig, SchemaAnalyzer, is_amount_name, is_identifier_name};
