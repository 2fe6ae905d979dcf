//! Filter stage.

use crate::input::{Record, Value, field_value};

use super::coerce::{as_strict_number, to_number_or_zero};
use super::operations::{FilterOperator, FilterStage, FilterValue};

/// Keep the rows matching the stage predicate.
pub(crate) fn apply(stage: &FilterStage, rows: Vec<Record>) -> Vec<Record> {
    rows.into_iter()
        .filter(|record| matches(stage, field_value(record, &stage.field)))
        .collect()
}

/// Evaluate the predicate against one value.
pub(crate) fn matches(stage: &FilterStage, value: &Value) -> bool {
    let target = stage.value.as_ref();
    // Incomplete configurations never reach here; the engine skips them.
    let Some(operator) = stage.operator else {
        return true;
    };

    match (operator, target) {
        (FilterOperator::IsEmpty, _) => value.is_null(),
        (FilterOperator::IsNotEmpty, _) => !value.is_null(),
        (FilterOperator::Equals, Some(FilterValue::Scalar(t))) => loose_equals(value, t),
        (FilterOperator::NotEquals, Some(FilterValue::Scalar(t))) => !loose_equals(value, t),
        (FilterOperator::Contains, Some(FilterValue::Scalar(t))) => value
            .display()
            .to_lowercase()
            .contains(&t.display().to_lowercase()),
        (FilterOperator::GreaterThan, Some(FilterValue::Scalar(t))) => {
            to_number_or_zero(value) > to_number_or_zero(t)
        }
        (FilterOperator::LessThan, Some(FilterValue::Scalar(t))) => {
            to_number_or_zero(value) < to_number_or_zero(t)
        }
        (FilterOperator::Between, Some(FilterValue::Range { min, max })) => {
            let n = to_number_or_zero(value);
            n >= to_number_or_zero(min) && n <= to_number_or_zero(max)
        }
        (FilterOperator::In, Some(FilterValue::List(items))) => {
            items.iter().any(|item| loose_equals(value, item))
        }
        _ => true,
    }
}

/// Numeric equality when both sides are numbers, else display equality.
pub(crate) fn loose_equals(value: &Value, target: &Value) -> bool {
    match (as_strict_number(value), as_strict_number(target)) {
        (Some(a), Some(b)) => a == b,
        _ => value.display() == target.display(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::record;

    fn amounts(values: &[i32]) -> Vec<Record> {
        values.iter().map(|v| record([("Amount", *v)])).collect()
    }

    fn kept(stage: &FilterStage, rows: Vec<Record>) -> Vec<String> {
        apply(stage, rows)
            .iter()
            .map(|r| field_value(r, "Amount").display())
            .collect()
    }

    #[test]
    fn test_between_inclusive() {
        let stage = FilterStage::new(
            "Amount",
            FilterOperator::Between,
            Some(FilterValue::Range {
                min: Value::from(10),
                max: Value::from(20),
            }),
        );
        assert_eq!(kept(&stage, amounts(&[9, 10, 15, 20, 21])), vec!["10", "15", "20"]);
    }

    #[test]
    fn test_contains_case_insensitive() {
        let stage = FilterStage::new(
            "Name",
            FilterOperator::Contains,
            Some(FilterValue::Scalar(Value::from("BYGG"))),
        );
        let rows = vec![
            record([("Name", "Vestland Bygg AS")]),
            record([("Name", "Nordic Marine")]),
        ];
        assert_eq!(apply(&stage, rows).len(), 1);
    }

    #[test]
    fn test_unparsable_compares_as_zero() {
        let stage = FilterStage::new(
            "Amount",
            FilterOperator::LessThan,
            Some(FilterValue::Scalar(Value::from(1))),
        );
        let rows = vec![record([("Amount", "n/a")]), record([("Amount", "5")])];
        assert_eq!(apply(&stage, rows).len(), 1);
    }

    #[test]
    fn test_in_and_equals_loose() {
        let stage = FilterStage::new(
            "Amount",
            FilterOperator::In,
            Some(FilterValue::List(vec![Value::from("10"), Value::from(20)])),
        );
        assert_eq!(kept(&stage, amounts(&[10, 15, 20])), vec!["10", "20"]);

        let eq = FilterStage::new(
            "Amount",
            FilterOperator::NotEquals,
            Some(FilterValue::Scalar(Value::from("15.0"))),
        );
        assert_eq!(kept(&eq, amounts(&[10, 15])), vec!["10"]);
    }

    #[test]
    fn test_is_empty() {
        let stage = FilterStage::new("Status", FilterOperator::IsEmpty, None);
        let rows = vec![
            record([("Status", Value::Null)]),
            record([("Status", Value::from(""))]),
            record([("Status", Value::from("Open"))]),
            record([("Other", Value::from("x"))]),
        ];
        assert_eq!(apply(&stage, rows).len(), 3);
    }
}
