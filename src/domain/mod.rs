//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`RunConfig`)
//! - the country-daily case series (`DailySeries`)
//! - fit outputs (`ExponentialFit`, `LogisticFit`)

pub mod types;

pub use types::*;
