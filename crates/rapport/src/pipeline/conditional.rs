//! Conditional stage.

use crate::input::{Record, Value, field_value};

use super::coerce::to_number_or_zero;
use super::filter::loose_equals;
use super::operations::{Condition, ConditionOperator, ConditionalStage};

/// Set `result_alias` from the first condition on every row.
pub(crate) fn apply(stage: &ConditionalStage, mut rows: Vec<Record>) -> Vec<Record> {
    let Some(condition) = stage.conditions.first() else {
        return rows;
    };

    for record in rows.iter_mut() {
        let outcome = if holds(condition, field_value(record, &condition.field)) {
            condition.then_value.clone()
        } else {
            condition.else_value.clone()
        };
        record.insert(stage.result_alias.clone(), outcome);
    }
    rows
}

fn holds(condition: &Condition, value: &Value) -> bool {
    let Some(operator) = condition.operator else {
        return false;
    };
    match operator {
        ConditionOperator::GreaterThan => to_number_or_zero(value) > to_number_or_zero(&condition.value),
        ConditionOperator::LessThan => to_number_or_zero(value) < to_number_or_zero(&condition.value),
        ConditionOperator::Equals => loose_equals(value, &condition.value),
    }
}
