//! Fuzz target for the formula compiler.
//!
//! This fuzzer tests that formula compilation and evaluation:
//! 1. Never panic on arbitrary source text
//! 2. Reject deep nesting instead of overflowing the stack
//! 3. Only ever return finite results

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rapport::formula::Formula;

#[derive(Debug, Arbitrary)]
struct FormulaInput<'a> {
    source: &'a str,
    left: f64,
    right: f64,
}

fuzz_target!(|input: FormulaInput| {
    if input.source.len() > 10_000 {
        return;
    }

    if let Ok(formula) = Formula::compile(input.source, "Premie", "Kostnad") {
        if let Ok(value) = formula.evaluate(input.left, input.right) {
            assert!(value.is_finite());
        }
    }
});
