//! Input/output helpers.
//!
//! - fit parameter export (JSON) (`export`)

pub mod export;

pub use export::*;
