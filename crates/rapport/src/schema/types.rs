//! Core type definitions for schema representation.

use serde::{Deserialize, Serialize};

/// Inferred data type for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    Number,
    Date,
    #[default]
    String,
}

impl InferredType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, InferredType::Number)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, InferredType::Date)
    }
}

/// Display category used by the field palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    /// Monetary amount.
    Currency,
    /// Calendar date or timestamp.
    Date,
    /// Low-cardinality categorical value.
    Category,
    /// Identifier (numeric or textual).
    Id,
    /// Anything else.
    #[default]
    Text,
}
