//! Declarative display remaps for group values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::Value;

/// Per-field mapping from a raw display value to a group label.
///
/// Serialized as `{ "field": { "raw": "label", ... }, ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemapTable {
    fields: IndexMap<String, IndexMap<String, String>>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one raw value of `field` to `label`.
    pub fn with_mapping(
        mut self,
        field: impl Into<String>,
        raw: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        self.insert(field, raw, label);
        self
    }

    /// Map a boolean flag to a two-valued label pair.
    ///
    /// `true`/`1` map to `true_label`; `false`/`0` map to `false_label`.
    pub fn with_boolean(
        mut self,
        field: impl Into<String>,
        true_label: impl Into<String>,
        false_label: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let true_label = true_label.into();
        let false_label = false_label.into();
        for raw in ["true", "1"] {
            self.insert(field.clone(), raw, true_label.clone());
        }
        for raw in ["false", "0"] {
            self.insert(field.clone(), raw, false_label.clone());
        }
        self
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        raw: impl Into<String>,
        label: impl Into<String>,
    ) {
        self.fields
            .entry(field.into())
            .or_default()
            .insert(raw.into(), label.into());
    }

    /// Label for `value` of `field`, if one is configured.
    pub fn lookup(&self, field: &str, value: &Value) -> Option<&str> {
        self.fields
            .get(field)?
            .get(value.display().as_str())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one mapping.
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
