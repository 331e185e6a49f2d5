//! Shared domain types.
//!
//! These types are intentionally kept small so they can be:
//!
//! - passed between the ingest, fit, and chart stages without copies of config
//! - exported to JSON after a run

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default CSSE time series of confirmed cases (global, one row per region).
pub const DEFAULT_SOURCE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/\
     csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_confirmed_global.csv";

/// Repository credited in every chart title.
pub const DATA_CREDIT: &str = "https://github.com/CSSEGISandData/COVID-19/";

/// Everything a single run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Value matched against the `Country/Region` column. Empty selects every row.
    pub country: String,
    pub output_dir: PathBuf,
    pub source_url: String,
    /// Anchor for all chart windows and forecast horizons.
    pub today: NaiveDate,
    /// Render each logistic chart with only its own overlay.
    pub separate_logistic: bool,
    pub export_fits: Option<PathBuf>,
    pub quiet: bool,
}

impl RunConfig {
    pub fn country_name(&self) -> String {
        country_display_name(&self.country)
    }
}

/// Human-facing name used in titles and axis labels.
pub fn country_display_name(country: &str) -> String {
    match country {
        "US" => "the US".to_string(),
        "" => "the World".to_string(),
        other => other.to_string(),
    }
}

/// Cumulative confirmed cases per day for one country.
///
/// Dates are strictly increasing and the series is never empty, so the first
/// date is a valid origin for the zero-based day index `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DailySeries {
    /// Build a series from unordered `(date, count)` pairs.
    ///
    /// Pairs sharing a date are summed.
    pub fn from_points(mut points: Vec<(NaiveDate, f64)>) -> Result<Self, AppError> {
        if points.is_empty() {
            return Err(AppError::empty_series("Daily series has no observations."));
        }
        points.sort_by_key(|(d, _)| *d);

        let mut merged: Vec<(NaiveDate, f64)> = Vec::with_capacity(points.len());
        for (date, value) in points {
            if let Some((last, total)) = merged.last_mut() {
                if *last == date {
                    *total += value;
                    continue;
                }
            }
            merged.push((date, value));
        }

        Ok(Self { points: merged })
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Date of day index 0.
    pub fn origin(&self) -> NaiveDate {
        self.points[0].0
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].0
    }

    pub fn last_value(&self) -> f64 {
        self.points[self.points.len() - 1].1
    }

    /// Day indices and observed counts, ready for least squares.
    pub fn index_xy(&self) -> (Vec<f64>, Vec<f64>) {
        self.points
            .iter()
            .enumerate()
            .map(|(i, &(_, y))| (i as f64, y))
            .unzip()
    }

    /// Calendar date for a (possibly fractional) day offset from the origin.
    ///
    /// Fractional offsets are floored to whole days.
    pub fn date_at(&self, t: f64) -> NaiveDate {
        let days = if t.is_finite() { t.floor() as i64 } else { 0 };
        self.origin() + Duration::days(days)
    }

    /// Number of whole days from the origin to `date`.
    pub fn day_index(&self, date: NaiveDate) -> i64 {
        (date - self.origin()).num_days()
    }
}

/// Result of fitting `count(t) = a^(t - b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExponentialFit {
    /// Daily growth factor.
    pub a: f64,
    /// Day offset at which the modelled count equals one.
    pub b: f64,
    pub sse: f64,
    pub rmse: f64,
    pub iterations: usize,
}

impl ExponentialFit {
    pub fn predict(&self, t: f64) -> f64 {
        crate::models::exponential(t, self.a, self.b)
    }
}

/// Result of fitting `count(t) = L / (1 + e^((1 - a)(t - b)))` with `a` and `b` fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticFit {
    pub a: f64,
    /// Assumed inflection offset (days from origin).
    pub b: f64,
    /// Fitted asymptote.
    pub l: f64,
    pub sse: f64,
    pub rmse: f64,
}

impl LogisticFit {
    pub fn predict(&self, t: f64) -> f64 {
        crate::models::logistic(t, self.a, self.b, self.l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_points_sorts_and_merges_duplicate_dates() {
        let series = DailySeries::from_points(vec![
            (d(2020, 1, 23), 2.0),
            (d(2020, 1, 22), 1.0),
            (d(2020, 1, 23), 3.0),
        ])
        .unwrap();
        assert_eq!(series.points(), &[(d(2020, 1, 22), 1.0), (d(2020, 1, 23), 5.0)]);
        assert_eq!(series.origin(), d(2020, 1, 22));
        assert_eq!(series.last_value(), 5.0);
    }

    #[test]
    fn empty_series_is_an_error() {
        let err = DailySeries::from_points(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::EmptySeries);
    }

    #[test]
    fn date_at_floors_fractional_offsets() {
        let series = DailySeries::from_points(vec![(d(2020, 1, 22), 1.0)]).unwrap();
        assert_eq!(series.date_at(3.7), d(2020, 1, 25));
        assert_eq!(series.date_at(-0.5), d(2020, 1, 21));
        assert_eq!(series.day_index(d(2020, 2, 1)), 10);
    }

    #[test]
    fn display_names() {
        assert_eq!(country_display_name("US"), "the US");
        assert_eq!(country_display_name(""), "the World");
        assert_eq!(country_display_name("Italy"), "Italy");
    }
}
