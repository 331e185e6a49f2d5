//! `covid19-curves` library crate.
//!
//! The binary (`covid19`) is a thin wrapper around this library so that:
//!
//! - the ingest, fit, and chart stages are testable without network or processes
//! - the pipeline can be driven with an in-memory CSV and any chart sink

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
