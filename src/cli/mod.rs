//! Command-line parsing.
//!
//! Every flag has a default matching the classic single-country setup and an
//! environment fallback, so `covid19` with no arguments (or a `.env` file)
//! reproduces the standard six charts.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::domain::DEFAULT_SOURCE_URL;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "covid19",
    version,
    about = "Plot confirmed COVID-19 cases for one country with exponential and logistic fits"
)]
pub struct Cli {
    /// Value of the `Country/Region` column to aggregate (empty string = whole world).
    #[arg(short = 'c', long, env = "COVID19_COUNTRY", default_value = "US")]
    pub country: String,

    /// Directory the PNG/SVG charts are written to.
    #[arg(short = 'o', long, env = "COVID19_OUTPUT_DIR", default_value = "/srv/www/tmp/")]
    pub output_dir: PathBuf,

    /// CSSE confirmed-case time series CSV.
    #[arg(long, env = "COVID19_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// Anchor date for chart windows and forecasts (YYYY-MM-DD, default: today).
    #[arg(long, env = "COVID19_TODAY")]
    pub today: Option<NaiveDate>,

    /// Draw each logistic chart with only its own fit instead of accumulating overlays.
    #[arg(long)]
    pub separate_logistic: bool,

    /// Export fitted parameters to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_fits: Option<PathBuf>,

    /// Do not print the run summary.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
