//! Schema inference over a sample of records.

use std::collections::HashSet;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::input::{Record, Value, field_value};
use crate::pipeline::coerce::{as_strict_number, looks_like_iso_date};
use crate::schema::{FieldCategory, FieldMetadata, InferredType, Schema};

// =============================================================================
// NAME HINTS
// =============================================================================

/// Substrings that mark a numeric field as a monetary amount.
const AMOUNT_TOKENS: &[&str] = &[
    "amount", "belop", "beløp", "sum", "total", "premie", "premium", "pris", "price", "kost",
    "cost", "verdi", "value", "garanti",
];

/// Whole name tokens that mark a field as an identifier.
const ID_TOKENS: &[&str] = &["id", "nr", "nummer", "number", "no", "ref", "kode", "code", "key"];

/// Capitalized word, lower-case run or digit run.
static NAME_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-ZÆØÅ]+[a-zæøå]*|[a-zæøå]+|[0-9]+").unwrap());

const MAX_SAMPLE_VALUES: usize = 10;

/// Thresholds used by [`SchemaAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerConfig {
    /// Maximum number of records inspected.
    pub sample_size: usize,
    /// Upper bound on distinct values for a categorical field.
    pub category_max_unique: usize,
    /// Unique/non-null ratio at which integer fields become identifiers.
    pub id_unique_ratio: f64,
    /// Smallest maximum magnitude for a currency field.
    pub currency_min_magnitude: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            category_max_unique: 20,
            id_unique_ratio: 0.8,
            currency_min_magnitude: 1000.0,
        }
    }
}

/// Infers a [`Schema`] from a dataset sample.
#[derive(Debug, Clone, Default)]
pub struct SchemaAnalyzer {
    config: AnalyzerConfig,
}

impl SchemaAnalyzer {
    /// Create an analyzer with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with custom thresholds.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze up to the configured sample size. `None` for an empty dataset.
    pub fn analyze(&self, data: &[Record]) -> Option<Schema> {
        self.analyze_with_sample(data, self.config.sample_size)
    }

    /// Analyze the first `sample_size` records.
    pub fn analyze_with_sample(&self, data: &[Record], sample_size: usize) -> Option<Schema> {
        if data.is_empty() {
            return None;
        }

        let sample = &data[..sample_size.clamp(1, data.len())];

        let mut names: IndexSet<&str> = IndexSet::new();
        for record in sample {
            names.extend(record.keys().map(String::as_str));
        }

        let mut fields: Vec<FieldMetadata> = names
            .into_iter()
            .map(|name| self.analyze_field(name, sample))
            .collect();

        fields.sort_by(|a, b| {
            (!a.is_groupable, !a.is_aggregatable, &a.name).cmp(&(
                !b.is_groupable,
                !b.is_aggregatable,
                &b.name,
            ))
        });

        debug!(
            records = data.len(),
            sampled = sample.len(),
            fields = fields.len(),
            "Inferred schema"
        );

        Some(Schema {
            total_records: data.len(),
            analyzed_records: sample.len(),
            fields,
        })
    }

    fn analyze_field(&self, name: &str, sample: &[Record]) -> FieldMetadata {
        let mut meta = FieldMetadata::new(name);
        let sample_size = sample.len();

        let values: Vec<&Value> = sample
            .iter()
            .map(|r| field_value(r, name))
            .filter(|v| !v.is_null())
            .collect();

        let distinct: IndexSet<String> = values.iter().map(|v| v.display()).collect();

        meta.total_count = sample_size;
        meta.unique_count = distinct.len();
        meta.null_percentage = (sample_size - values.len()) as f64 / sample_size as f64 * 100.0;
        meta.sample_values = distinct.iter().take(MAX_SAMPLE_VALUES).cloned().collect();

        if values.is_empty() {
            return meta;
        }

        let numbers: Vec<f64> = values
            .iter()
            .filter(|v| !matches!(v, Value::Bool(_)))
            .filter_map(|v| as_strict_number(v))
            .collect();

        if !numbers.is_empty() {
            meta.inferred_type = InferredType::Number;
            meta.is_aggregatable = true;

            let integral = numbers.iter().all(|n| n.fract() == 0.0);
            let numeric_unique = numbers
                .iter()
                .map(|n| n.to_bits())
                .collect::<HashSet<_>>()
                .len();
            let near_unique =
                numeric_unique as f64 >= self.config.id_unique_ratio * values.len() as f64;

            if integral && near_unique {
                meta.category = FieldCategory::Id;
                meta.is_aggregatable = false;
            } else if is_amount_name(name)
                && numbers.iter().any(|n| n.abs() >= self.config.currency_min_magnitude)
            {
                meta.category = FieldCategory::Currency;
            }
            return meta;
        }

        if values
            .iter()
            .all(|v| v.as_str().is_some_and(looks_like_iso_date))
        {
            meta.inferred_type = InferredType::Date;
            meta.category = FieldCategory::Date;
            meta.is_groupable = true;
            return meta;
        }

        if is_identifier_name(name) {
            meta.category = FieldCategory::Id;
            meta.is_groupable = true;
            return meta;
        }

        let category_cap =
            (self.config.category_max_unique as f64).min(0.5 * sample_size as f64);
        if meta.unique_count as f64 <= category_cap {
            meta.category = FieldCategory::Category;
            meta.is_groupable = true;
        }

        meta
    }
}

/// Case-insensitive substring match against the amount tokens.
pub fn is_amount_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    AMOUNT_TOKENS.iter().any(|token| lower.contains(token))
}

/// Whole-token match against the identifier tokens.
pub fn is_identifier_name(name: &str) -> bool {
    name_tokens(name)
        .iter()
        .any(|token| ID_TOKENS.contains(&token.as_str()))
}

/// Split a field name on separators and camelCase boundaries, lower-cased.
fn name_tokens(name: &str) -> Vec<String> {
    NAME_TOKEN
        .find_iter(name)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::record;

    fn policies() -> Vec<Record> {
        (0..40)
            .map(|i| {
                record([
                    ("PolicyId", Value::from(1000 + i)),
                    ("Status", Value::from(if i % 3 == 0 { "Open" } else { "Closed" })),
                    ("Premium", Value::from(1500.0 + (i % 7) as f64 * 250.5)),
                    ("Created", Value::from(format!("2024-0{}-1{}", i % 9 + 1, i % 10))),
                    ("Customer", Value::from(format!("Customer {}", i))),
                    ("Note", Value::Null),
                ])
            })
            .collect()
    }

    #[test]
    fn test_empty_dataset() {
        assert!(SchemaAnalyzer::new().analyze(&[]).is_none());
    }

    #[test]
    fn test_categories() {
        let schema = SchemaAnalyzer::new().analyze(&policies()).unwrap();
        assert_eq!(schema.total_records, 40);
        assert_eq!(schema.analyzed_records, 40);

        let id = schema.field("PolicyId").unwrap();
        assert_eq!(id.category, FieldCategory::Id);
        assert!(!id.is_aggregatable);

        let status = schema.field("Status").unwrap();
        assert_eq!(status.category, FieldCategory::Category);
        assert!(status.is_groupable);
        assert_eq!(status.unique_count, 2);

        let premium = schema.field("Premium").unwrap();
        assert_eq!(premium.inferred_type, InferredType::Number);
        assert_eq!(premium.category, FieldCategory::Currency);
        assert!(premium.is_aggregatable);

        let created = schema.field("Created").unwrap();
        assert_eq!(created.category, FieldCategory::Date);
        assert!(created.is_groupable);

        assert_eq!(schema.field("Customer").unwrap().category, FieldCategory::Text);

        let note = schema.field("Note").unwrap();
        assert_eq!(note.null_percentage, 100.0);
        assert_eq!(note.category, FieldCategory::Text);
    }

    #[test]
    fn test_field_order() {
        let schema = SchemaAnalyzer::new().analyze(&policies()).unwrap();
        assert_eq!(
            schema.field_names(),
            vec!["Created", "Status", "Premium", "Customer", "Note", "PolicyId"]
        );
    }

    #[test]
    fn test_sample_size_cap() {
        let schema = SchemaAnalyzer::new()
            .analyze_with_sample(&policies(), 10)
            .unwrap();
        assert_eq!(schema.analyzed_records, 10);
        assert_eq!(schema.field("Status").unwrap().total_count, 10);
    }

    #[test]
    fn test_single_integer_record_is_id() {
        let data = vec![record([("SaksNr", Value::from(40213))])];
        let schema = SchemaAnalyzer::new().analyze(&data).unwrap();
        let field = schema.field("SaksNr").unwrap();
        assert_eq!(field.category, FieldCategory::Id);
        assert!(!field.is_aggregatable);
    }

    #[test]
    fn test_string_identifier_hint() {
        let data: Vec<Record> = (0..30)
            .map(|i| record([("OrgNr", format!("NO{:06}", i))]))
            .collect();
        let schema = SchemaAnalyzer::new().analyze(&data).unwrap();
        let field = schema.field("OrgNr").unwrap();
        assert_eq!(field.category, FieldCategory::Id);
        assert!(field.is_groupable);
    }

    #[test]
    fn test_booleans_are_categories() {
        let data: Vec<Record> = (0..10)
            .map(|i| record([("IsBankGuarantee", i % 2 == 0)]))
            .collect();
        let schema = SchemaAnalyzer::new().analyze(&data).unwrap();
        assert_eq!(
            schema.field("IsBankGuarantee").unwrap().category,
            FieldCategory::Category
        );
    }

    #[test]
    fn test_name_hints() {
        assert!(is_amount_name("SumForsikring"));
        assert!(is_amount_name("Beløp"));
        assert!(!is_amount_name("Status"));
        assert!(is_identifier_name("OrgNr"));
        assert!(is_identifier_name("policy_no"));
        assert!(is_identifier_name("CustomerID"));
        assert!(!is_identifier_name("Notes"));
        assert!(!is_identifier_name("Nordic"));
    }
}
