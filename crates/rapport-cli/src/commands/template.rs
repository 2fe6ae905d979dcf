//! Template command - save, list, show and delete named templates.

use std::path::PathBuf;

use chrono::NaiveDate;
use colored::Colorize;
use rapport::TemplateStore;
use rapport::composer::duplicate_group_fields;
use rapport::template::{DateRange, ReportTemplate};

use super::read_pipeline;
use crate::cli::TemplateAction;

pub fn run(action: TemplateAction, store: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let store = TemplateStore::new(store);

    match action {
        TemplateAction::Save {
            name,
            pipeline,
            kind,
            from,
            to,
        } => {
            let operations = read_pipeline(&pipeline)?;
            let mut template = ReportTemplate::new(&name, operations);
            if let Some(kind) = kind {
                template = template.with_report_kind(kind);
            }
            if let (Some(from), Some(to)) = (from, to) {
                let range = DateRange::new(parse_date(&from)?, parse_date(&to)?)?;
                template = template.with_date_range(range);
            }

            for op in &template.operations {
                for dup in duplicate_group_fields(op) {
                    println!(
                        "{} group field '{}' appears {} times",
                        "⚠".yellow(),
                        dup.source_field,
                        dup.positions.len()
                    );
                }
            }

            let replaced = store.contains(&name);
            let path = store.save(&template)?;
            println!(
                "{} '{}' → {}",
                if replaced { "Replaced".yellow().bold() } else { "Saved".green().bold() },
                name,
                path.display()
            );
        }

        TemplateAction::List { json } => {
            let templates = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&templates)?);
                return Ok(());
            }
            if templates.is_empty() {
                println!("No templates in {}", store.root().display());
                return Ok(());
            }
            for template in &templates {
                println!(
                    "  {:30} {:>2} stages  {}  {}",
                    template.name.white().bold(),
                    template.operations.len(),
                    template.report_kind.as_deref().unwrap_or("-"),
                    template.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
                );
            }
        }

        TemplateAction::Show { name } => {
            let template = store.load(&name)?;
            println!("{} {}", "Template".cyan().bold(), template.name.white().bold());
            if let Some(kind) = &template.report_kind {
                println!("  Report kind: {}", kind);
            }
            if let Some(range) = &template.date_range {
                println!("  Period:      {} – {} ({} days)", range.from, range.to, range.days());
            }
            println!("  Created:     {}", template.created_at.to_rfc3339());
            println!();
            for (i, op) in template.operations.iter().enumerate() {
                println!("  {}. {}", i + 1, op.description());
            }
            if template.has_unknown_stages() {
                println!();
                println!(
                    "{}",
                    "This template contains stage types this version cannot run.".red()
                );
            }
        }

        TemplateAction::Delete { name } => {
            store.delete(&name)?;
            println!("{} '{}'", "Deleted".red().bold(), name);
        }
    }

    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", raw, e).into())
}
