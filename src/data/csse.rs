//! JHU CSSE confirmed-case time series.
//!
//! The table has one row per region and four metadata columns
//! (`Province/State`, `Country/Region`, `Lat`, `Long`) followed by one column
//! per day, headed `m/d/yy`, holding cumulative confirmed cases.
//!
//! Ingest is strict: a missing `Country/Region` column, an unparseable date
//! header, or a non-numeric cell aborts the run. Empty cells count as zero.

use std::io::Read;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::domain::DailySeries;
use crate::error::AppError;

const COUNTRY_COLUMN: &str = "Country/Region";
/// The blocking client otherwise defaults to a 30 second timeout.
const REQUEST_TIMEOUT: Option<Duration> = None;
/// Index of the first date column.
const FIRST_DATE_COLUMN: usize = 4;

/// Ingest output: the aggregated series plus row counts for reporting.
#[derive(Debug, Clone)]
pub struct CountryData {
    pub series: DailySeries,
    pub rows_read: usize,
    pub rows_matched: usize,
}

pub struct CsseClient {
    client: Client,
    url: String,
    timeout: Option<Duration>,
}

impl CsseClient {
    /// Build a client with no request timeout; the fetch waits as long as the server does.
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::ingest(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Download the CSV body. One attempt, no retry.
    pub fn fetch_csv(&self) -> Result<String, AppError> {
        info!(url = %self.url, "downloading time series");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::ingest(format!("CSV request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::ingest(format!(
                "CSV request failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::ingest(format!("Failed to read CSV body: {e}")))?;
        info!(bytes = body.len(), "downloaded time series");
        Ok(body)
    }
}

/// Sum every row whose `Country/Region` equals `country` into one daily series.
///
/// An empty `country` selects every row.
pub fn parse_country_series<R: Read>(reader: R, country: &str) -> Result<CountryData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::ingest(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let country_idx = headers
        .iter()
        .position(|h| h == COUNTRY_COLUMN)
        .ok_or_else(|| AppError::ingest(format!("CSV has no '{COUNTRY_COLUMN}' column.")))?;

    if headers.len() <= FIRST_DATE_COLUMN {
        return Err(AppError::ingest(format!(
            "CSV has {} columns; expected date columns from column {}.",
            headers.len(),
            FIRST_DATE_COLUMN + 1
        )));
    }

    let dates: Vec<NaiveDate> = headers
        .iter()
        .skip(FIRST_DATE_COLUMN)
        .map(parse_date_header)
        .collect::<Result<_, _>>()?;

    let mut totals = vec![0.0; dates.len()];
    let mut rows_read = 0usize;
    let mut rows_matched = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = result.map_err(|e| AppError::ingest(format!("CSV parse error on line {line}: {e}")))?;

        let row_country = record.get(country_idx).unwrap_or("");
        if !country.is_empty() && row_country != country {
            continue;
        }
        rows_matched += 1;

        for (j, total) in totals.iter_mut().enumerate() {
            let raw = record.get(FIRST_DATE_COLUMN + j).unwrap_or("");
            *total += parse_count(raw).map_err(|e| {
                AppError::ingest(format!("Line {line}, column '{}': {e}", &headers[FIRST_DATE_COLUMN + j]))
            })?;
        }
    }

    debug!(rows_read, rows_matched, country, "filtered time series");

    if rows_matched == 0 {
        return Err(AppError::empty_series(format!(
            "No rows for country '{country}' in the time series."
        )));
    }

    let series = DailySeries::from_points(dates.into_iter().zip(totals).collect())?;

    Ok(CountryData {
        series,
        rows_read,
        rows_matched,
    })
}

fn parse_date_header(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%m/%d/%y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .map_err(|e| AppError::ingest(format!("Invalid date column '{raw}': {e}")))
}

fn parse_count(raw: &str) -> Result<f64, String> {
    if raw.is_empty() {
        return Ok(0.0);
    }
    let v = raw
        .parse::<f64>()
        .map_err(|_| format!("invalid case count '{raw}'"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("non-finite case count '{raw}'"))
    }
}
