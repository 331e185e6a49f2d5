//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into a `RunConfig`
//! - runs the pipeline (download, charts, fits)
//! - prints the summary and writes the optional JSON export

use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::domain::RunConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `covid19` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let now = Local::now();
    let config = config_from_args(&cli, now.date_naive())?;
    let generated = now.format("%Y-%m-%d @ %H:%M %Z").to_string();

    let run = pipeline::run(&config, &generated)?;

    if !config.quiet {
        println!("{}", crate::report::format_run_summary(&run, &config));
    }

    if let Some(path) = &config.export_fits {
        crate::io::export::write_fits_json(path, &run, &config)?;
    }

    Ok(())
}

/// Logs go to stderr so stdout stays reserved for the summary.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn config_from_args(args: &Cli, today: NaiveDate) -> Result<RunConfig, AppError> {
    if args.source_url.trim().is_empty() {
        return Err(AppError::config("Source URL must not be empty."));
    }
    if args.output_dir.as_os_str().is_empty() {
        return Err(AppError::config("Output directory must not be empty."));
    }

    Ok(RunConfig {
        country: args.country.trim().to_string(),
        output_dir: args.output_dir.clone(),
        source_url: args.source_url.trim().to_string(),
        today: args.today.unwrap_or(today),
        separate_logistic: args.separate_logistic,
        export_fits: args.export_fits.clone(),
        quiet: args.quiet,
    })
}
