//! Curve fitting.
//!
//! Responsibilities:
//!
//! - exponential fit over `(a, b)` by Levenberg-Marquardt
//! - logistic fits over `L` with `a` reused and `b` assumed

pub mod exponential;
pub mod logistic;

pub use exponential::*;
pub use logistic::*;
