//! Sort stage and the comparators shared with grouped output ordering.

use std::cmp::Ordering;

use crate::input::{Record, Value, field_value};

use super::coerce::{as_strict_number, looks_like_iso_date, parse_lenient, to_epoch_millis};
use super::operations::{SortDirection, SortStage, SortValueType};

/// Stable sort of `rows` by the stage field.
pub(crate) fn apply(stage: &SortStage, mut rows: Vec<Record>) -> Vec<Record> {
    let value_type = stage
        .value_type
        .unwrap_or_else(|| infer_value_type(&rows, &stage.field));

    rows.sort_by(|a, b| {
        let ord = compare_typed(
            field_value(a, &stage.field),
            field_value(b, &stage.field),
            value_type,
        );
        match stage.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    rows
}

/// Infer a comparator from the non-null values of a column.
pub fn infer_value_type(rows: &[Record], field: &str) -> SortValueType {
    let mut values = rows
        .iter()
        .map(|r| field_value(r, field))
        .filter(|v| !v.is_null())
        .peekable();

    if values.peek().is_none() {
        return SortValueType::String;
    }

    let mut all_numbers = true;
    let mut all_dates = true;
    for value in values {
        all_numbers &= as_strict_number(value).is_some();
        all_dates &= value.as_str().is_some_and(looks_like_iso_date);
        if !all_numbers && !all_dates {
            break;
        }
    }

    if all_numbers {
        SortValueType::Number
    } else if all_dates {
        SortValueType::Date
    } else {
        SortValueType::String
    }
}

fn compare_typed(a: &Value, b: &Value, value_type: SortValueType) -> Ordering {
    match value_type {
        SortValueType::Number => {
            let na = as_strict_number(a).unwrap_or(0.0);
            let nb = as_strict_number(b).unwrap_or(0.0);
            na.partial_cmp(&nb).unwrap_or(Ordering::Equal)
        }
        SortValueType::Date => to_epoch_millis(a).cmp(&to_epoch_millis(b)),
        SortValueType::String => a.display().to_lowercase().cmp(&b.display().to_lowercase()),
    }
}

/// Numeric comparison after currency stripping, falling back to the raw
/// display strings when either side is not numeric.
pub fn compare_numeric_aware(a: &Value, b: &Value) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(na), Some(nb)) => na.partial_cmp(&nb).unwrap_or(Ordering::Equal),
        _ => a.display().cmp(&b.display()),
    }
}
