//! GroupBy stage: composite keys, aggregation and default ordering.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDateTime};
use indexmap::IndexMap;

use crate::input::{Record, Value, field_value};

use super::coerce::{is_false, is_true, parse_lenient, parse_timestamp};
use super::engine::EngineConfig;
use super::operations::{
    AggregationFunction, AggregationSpec, GroupByStage, GroupFieldSpec, SortDirection,
    TimeGranularity,
};
use super::remap::RemapTable;
use super::sort::compare_numeric_aware;

/// Group label for null or empty values.
pub const UNKNOWN_LABEL: &str = "Ukjent";

/// Label of the single group produced when there are no group fields.
pub const TOTAL_LABEL: &str = "Totalt";

/// Column holding [`TOTAL_LABEL`].
pub const TOTAL_FIELD: &str = "Gruppe";

/// Aggregation used for the default descending order, by priority.
const PRIMARY_PRIORITY: &[AggregationFunction] = &[
    AggregationFunction::Sum,
    AggregationFunction::Count,
    AggregationFunction::Avg,
    AggregationFunction::Max,
    AggregationFunction::Min,
    AggregationFunction::Median,
];

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Des",
];

/// Unit separator; cannot appear in a typed label by accident.
const KEY_SEPARATOR: &str = "\u{1f}";

struct Group<'r> {
    labels: Vec<String>,
    records: Vec<&'r Record>,
}

/// Partition `rows` by the stage's composite key and reduce each partition.
pub(crate) fn apply(stage: &GroupByStage, rows: &[Record], config: &EngineConfig) -> Vec<Record> {
    let fields: Vec<&GroupFieldSpec> = stage.active_group_fields().collect();

    // Totals for PERCENT_OF_TOTAL are taken over the whole stage input.
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for agg in &stage.aggregations {
        if agg.function == Some(AggregationFunction::PercentOfTotal) {
            totals
                .entry(agg.source_field.as_str())
                .or_insert_with(|| numeric_values(rows.iter(), &agg.source_field, false).sum());
        }
    }

    let mut groups: IndexMap<String, Group<'_>> = IndexMap::new();
    if fields.is_empty() {
        groups.insert(
            TOTAL_LABEL.to_string(),
            Group {
                labels: vec![TOTAL_LABEL.to_string()],
                records: rows.iter().collect(),
            },
        );
    } else {
        for record in rows {
            let labels: Vec<String> = fields
                .iter()
                .map(|spec| {
                    resolve_group_value(spec, field_value(record, &spec.source_field), &config.remaps)
                })
                .collect();
            let key = labels.join(KEY_SEPARATOR);
            groups
                .entry(key)
                .or_insert_with(|| Group {
                    labels,
                    records: Vec::new(),
                })
                .records
                .push(record);
        }
    }

    let mut output: Vec<Record> = groups
        .into_values()
        .map(|group| {
            let mut row = Record::new();
            if fields.is_empty() {
                row.insert(TOTAL_FIELD.to_string(), Value::from(TOTAL_LABEL));
            } else {
                for (spec, label) in fields.iter().zip(group.labels) {
                    row.insert(spec.output_name().to_string(), Value::String(label));
                }
            }
            for agg in &stage.aggregations {
                let include_zeros = agg.include_zeros.unwrap_or(config.include_zeros);
                let value = aggregate(agg, &group.records, &totals, include_zeros);
                row.insert(agg.alias.clone(), value);
            }
            row
        })
        .collect();

    order_groups(stage, &mut output);
    output
}

/// Resolve one group field value to its label.
pub fn resolve_group_value(spec: &GroupFieldSpec, value: &Value, remaps: &RemapTable) -> String {
    if value.is_null() {
        return UNKNOWN_LABEL.to_string();
    }
    if let Some(label) = remaps.lookup(&spec.source_field, value) {
        return label.to_string();
    }
    if let (Some(granularity), Value::String(raw)) = (spec.time_granularity, value) {
        if let Some(timestamp) = parse_timestamp(raw) {
            return bucket(timestamp, granularity);
        }
    }
    value.display()
}

/// Format a timestamp as its time bucket label.
pub fn bucket(timestamp: NaiveDateTime, granularity: TimeGranularity) -> String {
    let date = timestamp.date();
    match granularity {
        TimeGranularity::Day => format!("{}.{}.{}", date.day(), date.month(), date.year()),
        TimeGranularity::Month => {
            format!("{} {}", MONTH_NAMES[date.month0() as usize], date.year())
        }
        TimeGranularity::Quarter => format!("Q{} {}", date.month0() / 3 + 1, date.year()),
        TimeGranularity::Year => date.year().to_string(),
    }
}

/// Lenient numeric values of `field`, with unparsable entries dropped and
/// zeros dropped unless `include_zeros`.
fn numeric_values<'r>(
    records: impl Iterator<Item = &'r Record>,
    field: &str,
    include_zeros: bool,
) -> impl Iterator<Item = f64> {
    records
        .filter_map(move |r| parse_lenient(field_value(r, field)))
        .filter(move |n| include_zeros || *n != 0.0)
}

/// Compute one aggregation over a group's raw records.
pub(crate) fn aggregate(
    spec: &AggregationSpec,
    records: &[&Record],
    totals: &HashMap<&str, f64>,
    include_zeros: bool,
) -> Value {
    let field = spec.source_field.as_str();
    let size = records.len();
    let values = || numeric_values(records.iter().copied(), field, include_zeros);
    let raw = || records.iter().map(|r| field_value(r, field));
    // Incomplete aggregations never reach here; the engine skips the stage.
    let Some(function) = spec.function else {
        return Value::Null;
    };

    let number = match function {
        AggregationFunction::Count => size as f64,
        AggregationFunction::Sum => values().sum(),
        AggregationFunction::Avg => {
            let list: Vec<f64> = values().collect();
            if list.is_empty() {
                0.0
            } else {
                list.iter().sum::<f64>() / list.len() as f64
            }
        }
        AggregationFunction::Min => values().reduce(f64::min).unwrap_or(0.0),
        AggregationFunction::Max => values().reduce(f64::max).unwrap_or(0.0),
        AggregationFunction::Median => median(values().collect()),
        AggregationFunction::DistinctCount => raw().map(DistinctKey::of).collect::<HashSet<_>>().len() as f64,
        AggregationFunction::CountTrue => raw().filter(|v| is_true(v)).count() as f64,
        AggregationFunction::CountFalse => raw().filter(|v| is_false(v)).count() as f64,
        AggregationFunction::PercentTrue => percent(raw().filter(|v| is_true(v)).count(), size),
        AggregationFunction::PercentFalse => percent(raw().filter(|v| is_false(v)).count(), size),
        AggregationFunction::Any | AggregationFunction::First => {
            return raw().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null);
        }
        AggregationFunction::PercentOfTotal => {
            let total = totals.get(field).copied().unwrap_or(0.0);
            if total == 0.0 {
                0.0
            } else {
                numeric_values(records.iter().copied(), field, false).sum::<f64>() / total * 100.0
            }
        }
    };

    Value::Number(number)
}

fn median(mut list: Vec<f64>) -> f64 {
    if list.is_empty() {
        return 0.0;
    }
    list.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = list.len() / 2;
    if list.len() % 2 == 0 {
        (list[mid - 1] + list[mid]) / 2.0
    } else {
        list[mid]
    }
}

fn percent(count: usize, size: usize) -> f64 {
    if size == 0 {
        0.0
    } else {
        count as f64 / size as f64 * 100.0
    }
}

/// Hashable identity of a raw value for DISTINCT_COUNT.
#[derive(Debug, PartialEq, Eq, Hash)]
enum DistinctKey {
    Null,
    Bool(bool),
    Number(u64),
    String(String),
}

impl DistinctKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::Bool(b) => DistinctKey::Bool(*b),
            // -0.0 and 0.0 are the same value.
            Value::Number(n) => DistinctKey::Number(if *n == 0.0 { 0 } else { n.to_bits() }),
            Value::String(s) => DistinctKey::String(s.clone()),
            Value::Null => DistinctKey::Null,
        }
    }
}

/// Explicit `sortBy`, or descending by the primary aggregation.
fn order_groups(stage: &GroupByStage, rows: &mut [Record]) {
    if let Some(sort) = &stage.sort_by {
        rows.sort_by(|a, b| {
            let ord = compare_numeric_aware(field_value(a, &sort.field), field_value(b, &sort.field));
            match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        return;
    }

    let Some(primary) = primary_aggregation(&stage.aggregations) else {
        return;
    };
    let alias = primary.alias.as_str();
    rows.sort_by(|a, b| {
        let va = field_value(a, alias).as_number().unwrap_or(0.0);
        let vb = field_value(b, alias).as_number().unwrap_or(0.0);
        vb.partial_cmp(&va).unwrap_or(Ordering::Equal)
    });
}

/// The aggregation driving the default order.
pub fn primary_aggregation(aggregations: &[AggregationSpec]) -> Option<&AggregationSpec> {
    PRIMARY_PRIORITY
        .iter()
        .find_map(|f| aggregations.iter().find(|a| a.function == Some(*f)))
}
