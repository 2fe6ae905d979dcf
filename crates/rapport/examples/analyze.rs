//! Example: Analyze a dataset and build a first report from its schema.
//!
//! Usage:
//!   cargo run --example analyze -- <file_path>
//!
//! Example:
//!   cargo run --example analyze -- claims.csv

use std::env;
use std::path::Path;

use rapport::pipeline::{AggregationFunction, AggregationSpec, GroupByStage, GroupFieldSpec};
use rapport::{Operation, ReportBuilder};

fn main() -> rapport::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example analyze -- <file_path>");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let builder = ReportBuilder::new();
    let (data, source) = builder.load(path)?;
    let Some(schema) = builder.analyze(&data) else {
        println!("{} has no records", source.file);
        return Ok(());
    };

    let separator = "=".repeat(60);
    println!("{}", separator);
    println!("Schema: {} ({} records, {})", source.file, source.record_count, source.format);
    println!("{}", separator);

    for field in &schema.fields {
        println!(
            "  {:<24} {:<8} {:<9} group={:<5} agg={:<5} unique={} nulls={:.1}%",
            field.name,
            format!("{:?}", field.inferred_type),
            format!("{:?}", field.category),
            field.is_groupable,
            field.is_aggregatable,
            field.unique_count,
            field.null_percentage,
        );
    }
    println!();

    // Group by the first groupable field and sum the first measure.
    let Some(group_field) = schema.groupable_fields().next() else {
        println!("No groupable fields found");
        return Ok(());
    };
    let mut aggregations = vec![AggregationSpec::new("", AggregationFunction::Count, "Antall")];
    if let Some(measure) = schema.aggregatable_fields().next() {
        aggregations.insert(
            0,
            AggregationSpec::new(&measure.name, AggregationFunction::Sum, format!("Sum {}", measure.name)),
        );
    }

    let ops = vec![Operation::GroupBy(GroupByStage::new(
        vec![GroupFieldSpec::new(&group_field.name)],
        aggregations,
    ))];
    let result = builder.run(&data, &ops)?;

    println!("{}", result.columns.join(" | "));
    for row in result.head(20) {
        let cells: Vec<String> = result
            .columns
            .iter()
            .map(|c| row.get(c).map(|v| v.display()).unwrap_or_default())
            .collect();
        println!("{}", cells.join(" | "));
    }
    for warning in &result.warnings {
        println!("warning: {}", warning);
    }

    Ok(())
}
