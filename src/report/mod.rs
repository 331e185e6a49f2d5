//! Reporting utilities: the terminal run summary.

pub mod format;

pub use format::*;
