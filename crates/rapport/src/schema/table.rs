//! Dataset-level schema definition.

use serde::{Deserialize, Serialize};

use super::field::FieldMetadata;

/// Schema inferred over a sample of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Number of records in the dataset.
    pub total_records: usize,
    /// Number of records the inference looked at.
    pub analyzed_records: usize,
    /// Field metadata, groupable first, then aggregatable, then by name.
    pub fields: Vec<FieldMetadata>,
}

impl Schema {
    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields offered as grouping keys.
    pub fn groupable_fields(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.iter().filter(|f| f.is_groupable)
    }

    /// Fields offered for numeric aggregation.
    pub fn aggregatable_fields(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.iter().filter(|f| f.is_aggregatable)
    }

    /// Field names in schema order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
