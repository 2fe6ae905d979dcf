//! Fuzz target for the dataset loader.
//!
//! This fuzzer tests that JSON and delimited parsing:
//! 1. Never panics on malformed input
//! 2. Handles every common delimiter
//! 3. Produces records the analyzer can always consume

#![no_main]

use libfuzzer_sys::fuzz_target;
use rapport::{DatasetLoader, SchemaAnalyzer};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let loader = DatasetLoader::new();
    let analyzer = SchemaAnalyzer::new();

    if let Ok(records) = loader.parse_json(data) {
        let _ = analyzer.analyze(&records);
    }

    for delimiter in [b',', b';', b'\t'] {
        if let Ok(records) = loader.parse_delimited(data, delimiter) {
            let _ = analyzer.analyze(&records);
        }
    }
});
