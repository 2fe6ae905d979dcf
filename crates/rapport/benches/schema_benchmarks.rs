//! Schema inference and dataset loading benchmarks.
//!
//! Measures how the analyzer scales with row count and how sample size
//! bounds its cost on large datasets.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rapport::input::record;
use rapport::{DatasetLoader, Record, SchemaAnalyzer, Value};

/// Generate a claims-style dataset with mixed field kinds.
fn generate_claims(rows: usize) -> Vec<Record> {
    let statuses = ["Open", "Closed", "Pending", "Rejected"];
    let products = ["Bil", "Hus", "Reise", "Innbo", "Båt"];

    (0..rows)
        .map(|row| {
            record([
                ("ClaimId", Value::from(100_000 + row)),
                ("Status", Value::from(statuses[row % statuses.len()])),
                ("Product", Value::from(products[row % products.len()])),
                (
                    "Created",
                    Value::from(format!("2024-{:02}-{:02}", row % 12 + 1, row % 28 + 1)),
                ),
                ("ClaimAmount", Value::from(((row * 7919) % 250_000) as f64 + 0.5)),
                ("Approved", Value::from(row % 3 == 0)),
            ])
        })
        .collect()
}

/// Render rows as semicolon-separated text with Norwegian amounts.
fn generate_delimited(rows: usize) -> String {
    let mut data = String::from("ClaimId;Status;Created;ClaimAmount\n");
    for row in 0..rows {
        data.push_str(&format!(
            "{};{};{:02}.{:02}.2024;kr {} {:03},50\n",
            100_000 + row,
            if row % 2 == 0 { "Open" } else { "Closed" },
            row % 28 + 1,
            row % 12 + 1,
            row % 900 + 1,
            row % 1000,
        ));
    }
    data
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    let analyzer = SchemaAnalyzer::new();

    for rows in [10, 100, 1_000, 10_000].iter() {
        let data = generate_claims(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("claims_rows", rows), &data, |b, data| {
            b.iter(|| analyzer.analyze(black_box(data)))
        });
    }

    group.finish();
}

fn bench_sample_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_sample_size");
    let analyzer = SchemaAnalyzer::new();
    let data = generate_claims(10_000);

    for sample in [10, 100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("sample", sample), sample, |b, sample| {
            b.iter(|| analyzer.analyze_with_sample(black_box(&data), *sample))
        });
    }

    group.finish();
}

fn bench_parse_delimited(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_delimited");
    let loader = DatasetLoader::new();

    for rows in [100, 1_000, 10_000].iter() {
        let text = generate_delimited(*rows);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("semicolon_rows", rows), &text, |b, text| {
            b.iter(|| loader.parse_delimited(black_box(text.as_bytes()), b';'))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analyze, bench_sample_size, bench_parse_delimited);
criterion_main!(benches);
