//! Rapport CLI - analytical pipeline engine for tabular report data.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Analyze { file, sample, json } => {
            commands::analyze::run(file, sample, json, config, cli.verbose)
        }

        Commands::Run {
            file,
            pipeline,
            template,
            output,
            format,
            preview,
            store,
        } => commands::run::run(
            commands::run::RunArgs {
                file,
                pipeline,
                template,
                output,
                format,
                preview,
                store,
            },
            config,
            cli.verbose,
        ),

        Commands::Compare {
            current,
            previous,
            pipeline,
            labels,
            measure,
            json,
        } => commands::compare::run(current, previous, pipeline, labels, measure, json, config),

        Commands::Template { action, store } => commands::template::run(action, store),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
