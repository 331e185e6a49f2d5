//! Formatted terminal output.
//!
//! We keep formatting code in one place so the fitting code stays free of
//! presentation and output changes stay localized.

use crate::app::pipeline::RunOutput;
use crate::domain::RunConfig;
use crate::plot::logistic_label;

/// Format the run summary: series stats, fitted parameters, files written.
pub fn format_run_summary(run: &RunOutput, config: &RunConfig) -> String {
    let series = &run.data.series;
    let mut out = String::new();

    out.push_str("=== covid19 - Confirmed Case Curve Fits ===\n");
    out.push_str(&format!(
        "Country: {} ({})\n",
        config.country_name(),
        if config.country.is_empty() { "all rows" } else { config.country.as_str() }
    ));
    out.push_str(&format!("Anchor date: {}\n", config.today));
    out.push_str(&format!(
        "Series: {} days | {} .. {} | rows matched={}/{}\n",
        series.len(),
        series.origin(),
        series.last_date(),
        run.data.rows_matched,
        run.data.rows_read
    ));
    out.push_str(&format!("Latest cumulative count: {:.0}\n", series.last_value()));

    let exp = &run.exponential;
    out.push_str("\nExponential fit: count(t) = a^(t - b)\n");
    out.push_str(&format!(
        "  a={:.4}  b={:.2}  start={}  rmse={:.2}  iterations={}\n",
        exp.a,
        exp.b,
        series.date_at(exp.b),
        exp.rmse,
        exp.iterations
    ));

    out.push_str("\nLogistic fits: count(t) = L / (1 + e^((1 - a)(t - b)))\n");
    for fit in &run.logistic {
        out.push_str(&format!(
            "  {}  rmse={:.2}\n",
            logistic_label(series, fit),
            fit.rmse
        ));
    }

    out.push_str(&format!("\nWrote {} files:\n", run.written.len()));
    for path in &run.written {
        out.push_str(&format!("  {}\n", path.display()));
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::{Duration, NaiveDate};

    use crate::data::CountryData;
    use crate::domain::{DailySeries, ExponentialFit, LogisticFit};

    fn run_output() -> (RunOutput, RunConfig) {
        let origin = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
        let series =
            DailySeries::from_points((0..10).map(|i| (origin + Duration::days(i), (i * 10) as f64)).collect())
                .unwrap();
        let run = RunOutput {
            data: CountryData {
                series,
                rows_read: 250,
                rows_matched: 1,
            },
            exponential: ExponentialFit {
                a: 1.2345,
                b: 2.5,
                sse: 1.0,
                rmse: 0.5,
                iterations: 7,
            },
            logistic: vec![LogisticFit {
                a: 1.2345,
                b: 13.0,
                l: 1500.4,
                sse: 4.0,
                rmse: 1.0,
            }],
            charts: Vec::new(),
            written: vec![PathBuf::from("out/covid19.png"), PathBuf::from("out/covid19.svg")],
        };
        let config = RunConfig {
            country: "US".to_string(),
            output_dir: PathBuf::from("out"),
            source_url: "http://example.invalid/ts.csv".to_string(),
            today: NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            separate_logistic: false,
            export_fits: None,
            quiet: false,
        };
        (run, config)
    }

    #[test]
    fn summary_lists_params_and_files() {
        let (run, config) = run_output();
        let text = format_run_summary(&run, &config);
        assert!(text.contains("Country: the US (US)"));
        assert!(text.contains("Series: 10 days | 2020-01-22 .. 2020-01-31 | rows matched=1/250"));
        assert!(text.contains("a=1.2345  b=2.50  start=2020-01-24"));
        assert!(text.contains("L=1500, Assuming Inflection ~2020-02-04"));
        assert!(text.contains("out/covid19.svg"));
        assert!(!text.ends_with('\n'));
    }
}
