mod aggregate;
mod charts;
mod cli;
mod columns;
mod error;
mod fmt;
mod loader;
mod models;
mod pipeline;
mod profile;
mod report;
mod settings;

use clap::Parser;
use tracing_subscriber::{fmt as log_fmt, prelude::*, EnvFilter};

use cli::Cli;

fn init_logging(verbose: bool) {
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(log_fmt::layer().with_target(false).compact())
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = cli.settings().and_then(|settings| pipeline::run(&settings));

    match result {
        Ok(summary) => tracing::debug!(
            charts = summary.charts.len(),
            monthly = summary.monthly.is_some(),
            report = summary.report.is_some(),
            "run finished"
        ),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
