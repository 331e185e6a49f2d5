//! The fixed-order run: ingest -> baseline chart -> exponential fit -> logistic fits.
//!
//! Every stage runs unconditionally and any stage error ends the run. Charts
//! are written as soon as they are built, so a failing fit leaves the charts
//! of earlier stages on disk.
//!
//! Output goes through a `ChartSink` so the whole run can be exercised on an
//! in-memory CSV without network or drawing backends.

use std::io::Read;
use std::path::PathBuf;

use tracing::info;

use crate::data::{CountryData, CsseClient, parse_country_series};
use crate::domain::{ExponentialFit, LogisticFit, RunConfig};
use crate::error::AppError;
use crate::fit::{INFLECTION_OFFSETS, fit_exponential, fit_logistic, inflection_offset};
use crate::plot::{
    ChartContext, ChartSink, ChartSpec, FileRenderer, LOGISTIC_STEMS, baseline_chart, exponential_chart,
    logistic_chart,
};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: CountryData,
    pub exponential: ExponentialFit,
    pub logistic: Vec<LogisticFit>,
    pub charts: Vec<ChartSpec>,
    pub written: Vec<PathBuf>,
}

/// Download the time series and run every stage, writing charts to the output directory.
///
/// `generated` is the preformatted timestamp embedded in chart titles.
pub fn run(config: &RunConfig, generated: &str) -> Result<RunOutput, AppError> {
    let csv = CsseClient::new(config.source_url.as_str())?.fetch_csv()?;
    let mut sink = FileRenderer::new(&config.output_dir);
    run_with_csv(config, generated, csv.as_bytes(), &mut sink)
}

/// Run every stage on an already-downloaded CSV.
pub fn run_with_csv<R: Read, S: ChartSink>(
    config: &RunConfig,
    generated: &str,
    csv: R,
    sink: &mut S,
) -> Result<RunOutput, AppError> {
    // 1) Ingest.
    let data = parse_country_series(csv, &config.country)?;
    let series = &data.series;
    info!(
        country = %config.country,
        days = series.len(),
        rows = data.rows_matched,
        last_date = %series.last_date(),
        last_value = series.last_value(),
        "ingested series"
    );

    let ctx = ChartContext {
        country_name: config.country_name(),
        today: config.today,
        generated: generated.to_string(),
    };
    let mut charts = Vec::new();
    let mut written = Vec::new();

    // 2) Baseline chart.
    let chart = baseline_chart(series, &ctx);
    written.extend(sink.write_chart(&chart)?);
    charts.push(chart);

    // 3) Exponential fit.
    let exponential = fit_exponential(series)?;
    info!(
        a = exponential.a,
        b = exponential.b,
        rmse = exponential.rmse,
        iterations = exponential.iterations,
        "exponential fit"
    );
    let chart = exponential_chart(series, &exponential, &ctx);
    written.extend(sink.write_chart(&chart)?);
    charts.push(chart);

    // 4) Logistic fits, each reusing the exponential growth factor.
    let mut logistic: Vec<LogisticFit> = Vec::with_capacity(INFLECTION_OFFSETS.len());
    for (i, (&extra_days, stem)) in INFLECTION_OFFSETS.iter().zip(LOGISTIC_STEMS).enumerate() {
        let b = inflection_offset(series, extra_days);
        let fit = fit_logistic(series, exponential.a, b)?;
        info!(b, l = fit.l, rmse = fit.rmse, "logistic fit");
        logistic.push(fit);

        let overlays: Vec<&LogisticFit> = if config.separate_logistic {
            vec![&logistic[i]]
        } else {
            logistic.iter().collect()
        };
        let chart = logistic_chart(stem, series, &overlays, &ctx);
        written.extend(sink.write_chart(&chart)?);
        charts.push(chart);
    }

    Ok(RunOutput {
        data,
        exponential,
        logistic,
        charts,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{Duration, NaiveDate};

    /// Records specs instead of drawing them.
    #[derive(Default)]
    struct Recorder {
        stems: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl ChartSink for Recorder {
        fn write_chart(&mut self, spec: &ChartSpec) -> Result<Vec<PathBuf>, AppError> {
            if self.fail_on == Some(spec.file_stem.as_str()) {
                return Err(AppError::render("disk full"));
            }
            self.stems.push(spec.file_stem.clone());
            Ok(crate::plot::output_paths(&PathBuf::from("out"), &spec.file_stem).to_vec())
        }
    }

    fn synthetic_csv(days: i64) -> String {
        let origin = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
        let mut header = String::from("Province/State,Country/Region,Lat,Long");
        let mut north = String::from("North,Testland,0,0");
        let mut south = String::from("South,Testland,0,0");
        let mut other = String::from(",Elsewhere,0,0");
        for t in 0..days {
            let date = origin + Duration::days(t);
            header.push_str(&format!(",{}", date.format("%-m/%-d/%y")));
            let total = 1.3f64.powf(t as f64 - 5.0).round();
            let north_part = (total / 2.0).floor();
            north.push_str(&format!(",{north_part}"));
            south.push_str(&format!(",{}", total - north_part));
            other.push_str(",7");
        }
        format!("{header}\n{north}\n{south}\n{other}\n")
    }

    fn config(separate_logistic: bool) -> RunConfig {
        RunConfig {
            country: "Testland".to_string(),
            output_dir: PathBuf::from("out"),
            source_url: String::new(),
            today: NaiveDate::from_ymd_opt(2020, 3, 14).unwrap(),
            separate_logistic,
            export_fits: None,
            quiet: true,
        }
    }

    #[test]
    fn writes_six_files_in_stage_order() {
        let mut sink = Recorder::default();
        let out = run_with_csv(&config(false), "now", synthetic_csv(50).as_bytes(), &mut sink).unwrap();

        assert_eq!(
            sink.stems,
            vec!["covid19", "covid19-fit", "covid19-logistic-fit", "covid19-logistic-fit2"]
        );
        assert_eq!(out.written.len(), 6);
        assert_eq!(out.data.series.len(), 50);
        assert!((out.exponential.a - 1.3).abs() < 0.01, "a = {}", out.exponential.a);
        assert_eq!(out.logistic.len(), 2);
        assert_eq!(out.logistic[0].b, 53.0);
        assert_eq!(out.logistic[1].b, 60.0);
        assert_eq!(out.logistic[0].a, out.exponential.a);
    }

    #[test]
    fn second_logistic_chart_accumulates_overlays_by_default() {
        let mut sink = Recorder::default();
        let out = run_with_csv(&config(false), "now", synthetic_csv(50).as_bytes(), &mut sink).unwrap();
        assert_eq!(out.charts[2].overlays.len(), 1);
        assert_eq!(out.charts[3].overlays.len(), 2);
        assert_eq!(out.charts[3].overlays[0], out.charts[2].overlays[0]);
    }

    #[test]
    fn separate_logistic_charts_carry_one_overlay_each() {
        let mut sink = Recorder::default();
        let out = run_with_csv(&config(true), "now", synthetic_csv(50).as_bytes(), &mut sink).unwrap();
        assert_eq!(out.charts[2].overlays.len(), 1);
        assert_eq!(out.charts[3].overlays.len(), 1);
        assert_ne!(out.charts[3].overlays[0], out.charts[2].overlays[0]);
    }

    #[test]
    fn identical_input_gives_identical_charts() {
        let csv = synthetic_csv(40);
        let a = run_with_csv(&config(false), "now", csv.as_bytes(), &mut Recorder::default()).unwrap();
        let b = run_with_csv(&config(false), "now", csv.as_bytes(), &mut Recorder::default()).unwrap();
        assert_eq!(a.charts, b.charts);
    }

    #[test]
    fn absent_country_writes_nothing() {
        let mut sink = Recorder::default();
        let mut cfg = config(false);
        cfg.country = "Nowhere".to_string();
        let err = run_with_csv(&cfg, "now", synthetic_csv(20).as_bytes(), &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptySeries);
        assert!(sink.stems.is_empty());
    }

    #[test]
    fn render_failure_stops_later_stages() {
        let mut sink = Recorder {
            fail_on: Some("covid19-fit"),
            ..Recorder::default()
        };
        let err = run_with_csv(&config(false), "now", synthetic_csv(30).as_bytes(), &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
        assert_eq!(sink.stems, vec!["covid19"]);
    }
}
