//! Exponential growth fit: `count(t) = a^(t - b)`.
//!
//! Both parameters are free and unbounded. We seed Levenberg-Marquardt with a
//! log-linear regression on the positive counts:
//!
//! ```text
//! ln y = (t - b) ln a = t ln a - b ln a
//! ```
//!
//! so the slope gives `ln a` and the intercept gives `-b ln a`. On exactly
//! exponential data the seed is already the answer; on real data it puts the
//! optimizer in the right basin.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{DailySeries, ExponentialFit};
use crate::error::AppError;
use crate::math::{LeastSquaresProblem, LmOptions, levenberg_marquardt, solve_least_squares};
use crate::models::{exponential, exponential_gradient};

/// Starting point used when the log-linear seed is not available.
const FALLBACK_GUESS: (f64, f64) = (1.0, 1.0);

struct ExponentialProblem<'a> {
    t: &'a [f64],
    y: &'a [f64],
}

impl LeastSquaresProblem for ExponentialProblem<'_> {
    fn n_params(&self) -> usize {
        2
    }

    fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.t.len(),
            self.t
                .iter()
                .zip(self.y)
                .map(|(&t, &y)| exponential(t, p[0], p[1]) - y),
        )
    }

    fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
        let mut j = DMatrix::zeros(self.t.len(), 2);
        for (i, &t) in self.t.iter().enumerate() {
            let [d_a, d_b] = exponential_gradient(t, p[0], p[1]);
            j[(i, 0)] = d_a;
            j[(i, 1)] = d_b;
        }
        j
    }
}

/// Fit the exponential model to a country-daily series.
pub fn fit_exponential(series: &DailySeries) -> Result<ExponentialFit, AppError> {
    let (t, y) = series.index_xy();
    fit_exponential_xy(&t, &y)
}

/// Fit the exponential model to raw `(t, y)` observations.
pub fn fit_exponential_xy(t: &[f64], y: &[f64]) -> Result<ExponentialFit, AppError> {
    if t.is_empty() || t.len() != y.len() {
        return Err(AppError::fit("Exponential fit needs a non-empty series."));
    }

    let (a0, b0) = initial_guess(t, y).unwrap_or(FALLBACK_GUESS);
    debug!(a0, b0, "exponential fit seed");

    let problem = ExponentialProblem { t, y };
    let outcome = levenberg_marquardt(&problem, DVector::from_row_slice(&[a0, b0]), &LmOptions::default())
        .map_err(|e| AppError::fit(format!("Exponential fit failed: {e}.")))?;

    let (a, b) = (outcome.params[0], outcome.params[1]);
    if !(a.is_finite() && b.is_finite()) {
        return Err(AppError::fit("Exponential fit produced non-finite parameters."));
    }

    Ok(ExponentialFit {
        a,
        b,
        sse: outcome.sse,
        rmse: (outcome.sse / t.len() as f64).sqrt(),
        iterations: outcome.iterations,
    })
}

/// Log-linear seed `(a, b)`, or `None` if fewer than two positive counts or a flat trend.
pub fn initial_guess(t: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let (ts, logs): (Vec<f64>, Vec<f64>) = t
        .iter()
        .zip(y)
        .filter(|(_, y)| y.is_finite() && **y > 0.0)
        .map(|(&t, &y)| (t, y.ln()))
        .unzip();

    if ts.len() < 2 {
        return None;
    }

    let mut x = DMatrix::<f64>::zeros(ts.len(), 2);
    for (i, &t) in ts.iter().enumerate() {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = t;
    }
    let beta = solve_least_squares(&x, &DVector::from_vec(logs))?;
    let (intercept, slope) = (beta[0], beta[1]);

    if !slope.is_finite() || slope.abs() < 1e-12 {
        return None;
    }

    Some((slope.exp(), -intercept / slope))
}
