//! Data sources.
//!
//! - `csse`: download and aggregate the JHU CSSE confirmed-case time series

pub mod csse;

pub use csse::{CountryData, CsseClient, parse_country_series};
