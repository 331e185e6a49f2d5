//! Mathematical utilities: linear and nonlinear least squares.

pub mod lm;
pub mod ols;

pub use lm::*;
pub use ols::*;
