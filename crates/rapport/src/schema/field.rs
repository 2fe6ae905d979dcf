//! Per-field metadata.

use serde::{Deserialize, Serialize};

use super::types::{FieldCategory, InferredType};

/// Inferred metadata for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    /// Field name.
    pub name: String,
    pub inferred_type: InferredType,
    pub category: FieldCategory,
    /// Whether the field is offered as a grouping key.
    pub is_groupable: bool,
    /// Whether numeric aggregations make sense for the field.
    pub is_aggregatable: bool,
    /// Number of distinct non-null values in the sample.
    pub unique_count: usize,
    /// Number of sampled records.
    pub total_count: usize,
    /// Share of sampled records where the field is null, 0-100.
    pub null_percentage: f64,
    /// Up to ten distinct sample values, in first-seen order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_values: Vec<String>,
}

impl FieldMetadata {
    /// Create metadata with a name and defaults everywhere else.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inferred_type: InferredType::String,
            category: FieldCategory::Text,
            is_groupable: false,
            is_aggregatable: false,
            unique_count: 0,
            total_count: 0,
            null_percentage: 0.0,
            sample_values: Vec::new(),
        }
    }

    /// Number of null values in the sample.
    pub fn null_count(&self) -> usize {
        ((self.null_percentage / 100.0) * self.total_count as f64).round() as usize
    }
}
