//! Table printing and result export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use colored::Colorize;
use rapport::{PipelineResult, PipelineWarning, Value};

use crate::cli::OutputFormat;

const MAX_CELL_WIDTH: usize = 32;

/// Print rows as an aligned text table.
pub fn print_table(result: &PipelineResult, limit: Option<usize>) {
    if result.columns.is_empty() {
        println!("{}", "(no rows)".dimmed());
        return;
    }

    let rows = match limit {
        Some(n) => result.head(n),
        None => &result.rows,
    };

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .map(|c| format_cell(row.get(c).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", truncate(c, *w), w = w))
        .collect();
    println!("{}", header.join("  ").bold());

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    println!("{}", rule.join("  ").dimmed());

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", truncate(cell, *w), w = w))
            .collect();
        println!("{}", line.join("  "));
    }

    if rows.len() < result.rows.len() {
        println!(
            "{}",
            format!("... {} more rows", result.rows.len() - rows.len()).dimmed()
        );
    }
}

/// Print pipeline warnings, if any.
pub fn print_warnings(warnings: &[PipelineWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!();
    println!("{}", "Warnings:".yellow().bold());
    for warning in warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }
}

/// Write the result rows to a file.
pub fn write_result(
    result: &PipelineResult,
    path: &Path,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;

    match format {
        OutputFormat::Json => {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &result.rows)?;
            writer.write_all(b"\n")?;
        }
        OutputFormat::Csv | OutputFormat::Tsv => {
            let delimiter = match format {
                OutputFormat::Tsv => b'\t',
                _ => b',',
            };
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(file);
            writer.write_record(&result.columns)?;
            for row in &result.rows {
                let record: Vec<String> = result
                    .columns
                    .iter()
                    .map(|c| row.get(c).map(Value::display).unwrap_or_default())
                    .collect();
                writer.write_record(&record)?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}

/// Numbers get two decimals unless integral.
fn format_cell(value: &Value) -> String {
    match value {
        Value::Number(n) if n.fract() != 0.0 => format!("{:.2}", n),
        other => other.display(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&Value::Number(150.0)), "150");
        assert_eq!(format_cell(&Value::Number(33.3333)), "33.33");
        assert_eq!(format_cell(&Value::from("Open")), "Open");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer value", 6), "a lon…");
    }
}
