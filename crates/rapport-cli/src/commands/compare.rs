//! Compare command - run one pipeline against two periods.

use std::path::PathBuf;

use colored::Colorize;
use rapport::pipeline::primary_aggregation;
use rapport::{ReportBuilder, ReportConfig};

use super::output::{print_table, print_warnings};
use super::read_pipeline;

pub fn run(
    current: PathBuf,
    previous: PathBuf,
    pipeline: PathBuf,
    labels: String,
    measure: Option<String>,
    json_output: bool,
    config: ReportConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    for file in [&current, &previous] {
        if !file.exists() {
            return Err(format!("File not found: {}", file.display()).into());
        }
    }

    let (current_label, previous_label) = match labels.split_once(',') {
        Some((a, b)) => (a.trim().to_string(), b.trim().to_string()),
        None => return Err(format!("Expected two labels separated by a comma, got '{}'", labels).into()),
    };

    let operations = read_pipeline(&pipeline)?;
    let builder = ReportBuilder::with_config(config);
    let (current_data, _) = builder.load(&current)?;
    let (previous_data, _) = builder.load(&previous)?;

    let report = builder.compare(
        &operations,
        (current_label.as_str(), current_data.as_slice()),
        (previous_label.as_str(), previous_data.as_slice()),
    )?;

    let measure = measure.or_else(|| {
        operations
            .iter()
            .rev()
            .find_map(|op| op.as_group_by())
            .and_then(|stage| primary_aggregation(&stage.aggregations))
            .map(|agg| agg.alias.clone())
    });
    let deltas = measure
        .as_deref()
        .map(|m| report.deltas(m))
        .unwrap_or_default();

    if json_output {
        let output = serde_json::json!({
            "report": report,
            "measure": measure,
            "deltas": deltas,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for period in [&report.current, &report.previous] {
        println!(
            "{} {} ({} records → {} rows)",
            "Period".cyan().bold(),
            period.label.white().bold(),
            period.input_records,
            period.result.row_count
        );
        print_table(&period.result, Some(20));
        print_warnings(&period.result.warnings);
        println!();
    }

    if let Some(measure) = &measure {
        println!(
            "{} {} ({} vs {})",
            "Change in".yellow().bold(),
            measure.white().bold(),
            current_label,
            previous_label
        );
        for delta in &deltas {
            let change = format!("{:+.2}", delta.change);
            let change = if delta.change >= 0.0 {
                change.green()
            } else {
                change.red()
            };
            let percent = delta
                .change_percent
                .map(|p| format!("{:+.1}%", p))
                .unwrap_or_else(|| "new".to_string());
            println!(
                "  {:30} {:>14.2} {:>14.2} {:>14} {:>9}",
                delta.key, delta.current, delta.previous, change, percent
            );
        }
    }

    Ok(())
}
