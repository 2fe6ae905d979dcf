//! Run command - execute a pipeline over a data file.

use std::path::PathBuf;

use colored::Colorize;
use rapport::{ReportBuilder, ReportConfig, TemplateStore};

use super::output::{print_table, print_warnings, write_result};
use super::read_pipeline;
use crate::cli::OutputFormat;

const PRINTED_ROWS: usize = 50;

pub struct RunArgs {
    pub file: PathBuf,
    pub pipeline: Option<PathBuf>,
    pub template: Option<String>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub preview: bool,
    pub store: PathBuf,
}

pub fn run(
    args: RunArgs,
    config: ReportConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !args.file.exists() {
        return Err(format!("File not found: {}", args.file.display()).into());
    }

    let operations = match (&args.pipeline, &args.template) {
        (Some(path), _) => read_pipeline(path)?,
        (None, Some(name)) => TemplateStore::new(&args.store).load(name)?.operations,
        (None, None) => return Err("Either --pipeline or --template is required".into()),
    };

    let builder = ReportBuilder::with_config(config);
    let (data, source) = builder.load(&args.file)?;

    if verbose {
        println!("{}", "Pipeline:".yellow().bold());
        for (i, op) in operations.iter().enumerate() {
            println!("  {}. {}", i + 1, op.description());
        }
        println!();
    }

    let result = if args.preview {
        builder.preview(&data, &operations)?
    } else {
        builder.run(&data, &operations)?
    };

    println!(
        "{} {} {} → {} rows{}",
        "Ran".cyan().bold(),
        operations.len(),
        if operations.len() == 1 { "stage" } else { "stages" },
        result.row_count.to_string().white().bold(),
        if args.preview {
            format!(" (preview of {} records)", builder.config().preview_rows.min(source.record_count))
        } else {
            format!(" from {} records", source.record_count)
        }
    );

    match &args.output {
        Some(path) => {
            write_result(&result, path, &args.format)?;
            println!(
                "{} {} ({})",
                "Wrote".green().bold(),
                path.display(),
                args.format
            );
        }
        None => {
            println!();
            print_table(&result, Some(PRINTED_ROWS));
        }
    }

    print_warnings(&result.warnings);
    Ok(())
}
