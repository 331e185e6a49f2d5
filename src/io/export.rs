//! Export fitted parameters to JSON.
//!
//! The fit parameters only live for one run; this export is the portable
//! record of them (model, parameters, and the calendar dates they imply).

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::pipeline::RunOutput;
use crate::domain::{ExponentialFit, LogisticFit, RunConfig};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitsFile {
    pub tool: String,
    pub country: String,
    pub anchor_date: NaiveDate,
    pub origin: NaiveDate,
    pub last_date: NaiveDate,
    pub days: usize,
    pub last_value: f64,
    pub exponential: ExponentialEntry,
    pub logistic: Vec<LogisticEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExponentialEntry {
    #[serde(flatten)]
    pub fit: ExponentialFit,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticEntry {
    #[serde(flatten)]
    pub fit: LogisticFit,
    pub inflection_date: NaiveDate,
}

impl FitsFile {
    pub fn from_run(run: &RunOutput, config: &RunConfig) -> Self {
        let series = &run.data.series;
        Self {
            tool: "covid19".to_string(),
            country: config.country.clone(),
            anchor_date: config.today,
            origin: series.origin(),
            last_date: series.last_date(),
            days: series.len(),
            last_value: series.last_value(),
            exponential: ExponentialEntry {
                fit: run.exponential.clone(),
                start_date: series.date_at(run.exponential.b),
            },
            logistic: run
                .logistic
                .iter()
                .map(|fit| LogisticEntry {
                    fit: fit.clone(),
                    inflection_date: series.date_at(fit.b),
                })
                .collect(),
        }
    }
}

/// Write the fitted parameters of a run to a JSON file.
pub fn write_fits_json(path: &Path, run: &RunOutput, config: &RunConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::render(format!("Failed to create fits JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &FitsFile::from_run(run, config))
        .map_err(|e| AppError::render(format!("Failed to write fits JSON: {e}")))?;

    info!(path = %path.display(), "wrote fit export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::Duration;

    use crate::data::CountryData;
    use crate::domain::DailySeries;

    #[test]
    fn export_carries_params_and_implied_dates() {
        let origin = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
        let series =
            DailySeries::from_points((0..5).map(|i| (origin + Duration::days(i), i as f64)).collect()).unwrap();
        let run = RunOutput {
            data: CountryData {
                series,
                rows_read: 3,
                rows_matched: 1,
            },
            exponential: ExponentialFit {
                a: 1.5,
                b: -1.2,
                sse: 0.1,
                rmse: 0.2,
                iterations: 4,
            },
            logistic: vec![LogisticFit {
                a: 1.5,
                b: 8.0,
                l: 99.0,
                sse: 1.0,
                rmse: 0.5,
            }],
            charts: Vec::new(),
            written: Vec::new(),
        };
        let config = RunConfig {
            country: "Italy".to_string(),
            output_dir: PathBuf::from("out"),
            source_url: String::new(),
            today: NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            separate_logistic: false,
            export_fits: None,
            quiet: true,
        };

        let path = std::env::temp_dir().join(format!("covid19-fits-{}.json", std::process::id()));
        write_fits_json(&path, &run, &config).unwrap();
        let value: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(value["country"], "Italy");
        assert_eq!(value["days"], 5);
        assert_eq!(value["exponential"]["a"], 1.5);
        assert_eq!(value["exponential"]["start_date"], "2020-01-20");
        assert_eq!(value["logistic"][0]["l"], 99.0);
        assert_eq!(value["logistic"][0]["inflection_date"], "2020-01-30");
    }
}
