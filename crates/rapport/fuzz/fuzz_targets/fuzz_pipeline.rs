//! Fuzz target for pipeline execution.
//!
//! Feeds arbitrary JSON pipeline definitions through the engine against a
//! small fixed dataset. Deserialization may fail; execution must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rapport::input::record;
use rapport::{Operation, PipelineEngine, Value};

fuzz_target!(|data: &[u8]| {
    if data.len() > 50_000 {
        return;
    }

    let Ok(ops) = serde_json::from_slice::<Vec<Operation>>(data) else {
        return;
    };

    let rows = vec![
        record([
            ("Status", Value::from("Open")),
            ("Amount", Value::from("kr 1 200,50")),
            ("Created", Value::from("2024-03-15")),
        ]),
        record([
            ("Status", Value::Null),
            ("Amount", Value::from(-40)),
            ("Created", Value::from("15.11.2023")),
        ]),
        record([
            ("Status", Value::from("Closed")),
            ("Amount", Value::from(true)),
            ("Created", Value::from("not a date")),
        ]),
    ];

    let _ = PipelineEngine::new().execute(&rows, &ops);
});
