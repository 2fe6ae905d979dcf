//! Calculate stage.

use tracing::warn;

use crate::error::PipelineWarning;
use crate::formula::Formula;
use crate::input::{Record, Value, field_value};

use super::coerce::parse_lenient;
use super::operations::CalculateStage;

/// Derive `result_alias` on every row from the two input fields.
///
/// A formula that does not compile yields 0 on every row with a single
/// warning; a row whose result is not finite yields 0 with a per-row warning.
pub(crate) fn apply(
    stage: &CalculateStage,
    stage_index: usize,
    mut rows: Vec<Record>,
    warnings: &mut Vec<PipelineWarning>,
) -> Vec<Record> {
    let left = stage.input_fields[0].as_str();
    let right = stage.input_fields[1].as_str();

    let formula = match Formula::compile(&stage.formula, left, right) {
        Ok(formula) => Some(formula),
        Err(e) => {
            warn!(stage = stage_index, formula = %stage.formula, "Formula rejected: {}", e);
            warnings.push(PipelineWarning::formula(
                stage_index,
                None,
                format!("'{}': {}", stage.formula, e),
            ));
            None
        }
    };

    for (row_index, record) in rows.iter_mut().enumerate() {
        let result = match &formula {
            Some(formula) => {
                let a = parse_lenient(field_value(record, left)).unwrap_or(0.0);
                let b = parse_lenient(field_value(record, right)).unwrap_or(0.0);
                match formula.evaluate(a, b) {
                    Ok(n) => n,
                    Err(e) => {
                        warn!(stage = stage_index, row = row_index, "Formula evaluation failed: {}", e);
                        warnings.push(PipelineWarning::formula(
                            stage_index,
                            Some(row_index),
                            e.to_string(),
                        ));
                        0.0
                    }
                }
            }
            None => 0.0,
        };
        record.insert(stage.result_alias.clone(), Value::Number(result));
    }

    rows
}
