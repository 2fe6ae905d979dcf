//! Analyze command - infer the schema of a data file.

use std::path::PathBuf;

use colored::Colorize;
use rapport::{FieldCategory, ReportBuilder, ReportConfig, SchemaAnalyzer};

pub fn run(
    file: PathBuf,
    sample: Option<usize>,
    json_output: bool,
    config: ReportConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let builder = ReportBuilder::with_config(config);
    let (data, source) = builder.load(&file)?;

    let sample_size = sample.unwrap_or(builder.config().analyzer.sample_size);
    let schema = SchemaAnalyzer::with_config(builder.config().analyzer.clone())
        .analyze_with_sample(&data, sample_size)
        .ok_or_else(|| format!("No records in {}", file.display()))?;

    if json_output {
        let output = serde_json::json!({
            "source": source,
            "schema": schema,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Analyzed".cyan().bold(),
        source.file.white()
    );
    println!(
        "  {} records, {} fields, {} sampled ({})",
        schema.total_records.to_string().white().bold(),
        schema.fields.len(),
        schema.analyzed_records,
        source.format
    );
    if verbose {
        println!("  {}", source.hash.dimmed());
    }
    println!();

    println!(
        "  {:24} {:8} {:10} {:>7} {:>7}  {}",
        "Field".bold(),
        "Type".bold(),
        "Category".bold(),
        "Unique".bold(),
        "Null %".bold(),
        "Use".bold()
    );
    for field in &schema.fields {
        let category = format!("{:?}", field.category).to_lowercase();
        let category = match field.category {
            FieldCategory::Currency => category.green(),
            FieldCategory::Date => category.blue(),
            FieldCategory::Category => category.yellow(),
            FieldCategory::Id => category.magenta(),
            FieldCategory::Text => category.normal(),
        };

        let mut uses = Vec::new();
        if field.is_groupable {
            uses.push("group");
        }
        if field.is_aggregatable {
            uses.push("aggregate");
        }

        println!(
            "  {:24} {:8} {:10} {:>7} {:>6.1}%  {}",
            field.name,
            format!("{:?}", field.inferred_type).to_lowercase(),
            category,
            field.unique_count,
            field.null_percentage,
            uses.join(", ").dimmed()
        );

        if verbose && !field.sample_values.is_empty() {
            println!("  {:24} {}", "", field.sample_values.join(", ").dimmed());
        }
    }

    Ok(())
}
