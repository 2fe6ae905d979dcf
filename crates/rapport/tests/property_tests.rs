//! Property-based tests for the pipeline engine.
//!
//! These tests use proptest to generate random datasets and pipelines and
//! verify that the engine keeps its invariants under all of them.
//!
//! # Testing Philosophy
//!
//! Property-based tests verify:
//! 1. **No panics**: The engine and the formula compiler never crash
//! 2. **Determinism**: Same input always produces same output
//! 3. **Row counts**: Each stage kind changes row count only as allowed
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p rapport --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p rapport --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use rapport::formula::Formula;
use rapport::input::{field_value, record};
use rapport::pipeline::{
    AggregationFunction, AggregationSpec, CalculateStage, FilterOperator, FilterStage,
    FilterValue, GroupByStage, GroupFieldSpec, RemapTable, SortDirection, SortStage,
    resolve_group_value,
};
use rapport::{Operation, PipelineEngine, Record, Value};

// =============================================================================
// Test Strategies
// =============================================================================

/// Generate a scalar cell value of any kind.
fn any_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-10_000i64..10_000).prop_map(Value::from),
        (-1e6f64..1e6).prop_map(Value::Number),
        "[A-Za-z ]{0,8}".prop_map(Value::String),
        "kr [0-9]{1,3} [0-9]{3},[0-9]{2}".prop_map(Value::String),
        "20[0-9]{2}-(0[1-9]|1[0-2])-(0[1-9]|1[0-9]|2[0-8])".prop_map(Value::String),
    ]
}

/// Generate a dataset over a fixed set of fields.
fn dataset() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(
        (
            prop_oneof![Just("Open"), Just("Closed"), Just(""), Just("Pending")],
            any_value(),
            any_value(),
        ),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(status, amount, other)| {
                record([
                    ("Status", Value::from(status)),
                    ("Amount", amount),
                    ("Other", other),
                ])
            })
            .collect()
    })
}

fn aggregation_function() -> impl Strategy<Value = AggregationFunction> {
    prop_oneof![
        Just(AggregationFunction::Count),
        Just(AggregationFunction::Sum),
        Just(AggregationFunction::Avg),
        Just(AggregationFunction::Min),
        Just(AggregationFunction::Max),
        Just(AggregationFunction::Median),
        Just(AggregationFunction::DistinctCount),
        Just(AggregationFunction::CountTrue),
        Just(AggregationFunction::PercentFalse),
        Just(AggregationFunction::First),
        Just(AggregationFunction::PercentOfTotal),
    ]
}

/// Generate a single stage that is always fully configured.
fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (any_value(), prop_oneof![
            Just(FilterOperator::Equals),
            Just(FilterOperator::GreaterThan),
            Just(FilterOperator::Contains),
            Just(FilterOperator::IsNotEmpty),
        ])
            .prop_map(|(v, op)| Operation::Filter(FilterStage::new(
                "Amount",
                op,
                Some(FilterValue::Scalar(v)),
            ))),
        (any::<bool>(), aggregation_function()).prop_map(|(by_status, f)| {
            let fields = if by_status {
                vec![GroupFieldSpec::new("Status")]
            } else {
                vec![]
            };
            Operation::GroupBy(GroupByStage::new(
                fields,
                vec![AggregationSpec::new("Amount", f, "Agg")],
            ))
        }),
        "(a|b|2)( [-+*/] (a|b|0|3)){0,3}".prop_map(|f| Operation::Calculate(
            CalculateStage::new(f, "Calc", "Amount", "Other")
        )),
        any::<bool>().prop_map(|asc| Operation::Sort(SortStage::new(
            "Amount",
            if asc { SortDirection::Asc } else { SortDirection::Desc },
        ))),
    ]
}

// =============================================================================
// Engine properties
// =============================================================================

proptest! {
    #[test]
    fn execute_is_deterministic(
        data in dataset(),
        ops in prop::collection::vec(operation(), 0..5),
    ) {
        let engine = PipelineEngine::new();
        let first = engine.execute(&data, &ops).unwrap();
        let second = engine.execute(&data, &ops).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn zero_group_fields_yield_one_row(
        data in dataset(),
        f in aggregation_function(),
    ) {
        let ops = vec![Operation::GroupBy(GroupByStage::new(
            vec![],
            vec![AggregationSpec::new("Amount", f, "Agg")],
        ))];
        let result = PipelineEngine::new().execute(&data, &ops).unwrap();
        prop_assert_eq!(result.row_count, 1);
    }

    #[test]
    fn group_count_matches_distinct_resolved_keys(data in dataset()) {
        let spec = GroupFieldSpec::new("Status");
        let remaps = RemapTable::new();
        let distinct: HashSet<String> = data
            .iter()
            .map(|r| resolve_group_value(&spec, field_value(r, "Status"), &remaps))
            .collect();

        let ops = vec![Operation::GroupBy(GroupByStage::new(
            vec![spec.clone()],
            vec![AggregationSpec::new("", AggregationFunction::Count, "N")],
        ))];
        let result = PipelineEngine::new().execute(&data, &ops).unwrap();
        prop_assert_eq!(result.row_count, distinct.len());
    }

    #[test]
    fn sort_preserves_row_count(data in dataset(), asc in any::<bool>()) {
        let direction = if asc { SortDirection::Asc } else { SortDirection::Desc };
        let ops = vec![Operation::Sort(SortStage::new("Amount", direction))];
        let result = PipelineEngine::new().execute(&data, &ops).unwrap();
        prop_assert_eq!(result.row_count, data.len());
    }

    #[test]
    fn non_grouping_stages_never_add_rows(
        data in dataset(),
        ops in prop::collection::vec(operation(), 0..5),
    ) {
        let ops: Vec<Operation> = ops
            .into_iter()
            .filter(|op| op.as_group_by().is_none())
            .collect();
        let result = PipelineEngine::new().execute(&data, &ops).unwrap();
        prop_assert!(result.row_count <= data.len());
    }

    #[test]
    fn calculate_outputs_are_finite(data in dataset()) {
        let ops = vec![Operation::Calculate(CalculateStage::new(
            "(a - b) / b * 100", "Pct", "Amount", "Other",
        ))];
        let result = PipelineEngine::new().execute(&data, &ops).unwrap();
        for row in &result.rows {
            let n = row["Pct"].as_number().unwrap();
            prop_assert!(n.is_finite());
        }
    }
}

// =============================================================================
// Formula compiler robustness
// =============================================================================

proptest! {
    #[test]
    fn formula_compile_never_panics(source in "\\PC{0,40}") {
        let _ = Formula::compile(&source, "Premie", "Kostnad");
    }

    #[test]
    fn formula_symbol_soup_never_panics(source in "[ab0-9+\\-*/() .\\[\\]]{0,60}") {
        if let Ok(formula) = Formula::compile(&source, "a", "b") {
            let _ = formula.evaluate(1.5, -2.0);
            let _ = formula.evaluate(0.0, 0.0);
        }
    }

    #[test]
    fn deep_nesting_is_rejected_not_overflowed(depth in 1usize..500) {
        let source = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        let result = Formula::compile(&source, "x", "y");
        if depth <= 32 {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn positional_addition_matches_arithmetic(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let formula = Formula::compile("a + b", "x", "y").unwrap();
        prop_assert_eq!(formula.evaluate(a, b).unwrap(), a + b);
    }
}
