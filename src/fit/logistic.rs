//! Logistic saturation fit: `count(t) = L / (1 + e^((1 - a)(t - b)))`.
//!
//! The growth factor `a` comes from the exponential fit and the inflection
//! offset `b` is assumed, so only the asymptote `L` is free. The model is
//! linear in `L`, which makes the least squares problem a one-column
//! regression with a closed-form optimum.

use nalgebra::{DMatrix, DVector};

use crate::domain::{DailySeries, LogisticFit};
use crate::error::AppError;
use crate::math::solve_least_squares;
use crate::models::{logistic, logistic_shape};

/// Days past the end of the series at which each logistic fit assumes the inflection.
pub const INFLECTION_OFFSETS: [usize; 2] = [3, 10];

/// Assumed inflection day index: series length plus `extra_days`.
pub fn inflection_offset(series: &DailySeries, extra_days: usize) -> f64 {
    (series.len() + extra_days) as f64
}

/// Fit `L` on a country-daily series with `a` and `b` held fixed.
pub fn fit_logistic(series: &DailySeries, a: f64, b: f64) -> Result<LogisticFit, AppError> {
    let (t, y) = series.index_xy();
    fit_logistic_xy(&t, &y, a, b)
}

/// Fit `L` on raw `(t, y)` observations with `a` and `b` held fixed.
pub fn fit_logistic_xy(t: &[f64], y: &[f64], a: f64, b: f64) -> Result<LogisticFit, AppError> {
    if t.is_empty() || t.len() != y.len() {
        return Err(AppError::fit("Logistic fit needs a non-empty series."));
    }

    let shape = DMatrix::from_iterator(t.len(), 1, t.iter().map(|&t| logistic_shape(t, a, b)));
    if shape.iter().any(|g| !g.is_finite()) {
        return Err(AppError::fit(format!(
            "Logistic shape is not finite for a={a:.4}, b={b:.1}."
        )));
    }
    if shape.norm_squared() == 0.0 {
        return Err(AppError::fit(format!(
            "Logistic shape vanishes on every observation for a={a:.4}, b={b:.1}."
        )));
    }

    let beta = solve_least_squares(&shape, &DVector::from_column_slice(y))
        .ok_or_else(|| AppError::fit(format!("Logistic fit did not converge (a={a:.4}, b={b:.1}).")))?;
    let l = beta[0];

    let sse: f64 = t
        .iter()
        .zip(y)
        .map(|(&t, &y)| {
            let r = logistic(t, a, b, l) - y;
            r * r
        })
        .sum();
    if !sse.is_finite() {
        return Err(AppError::fit("Logistic fit produced a non-finite residual."));
    }

    Ok(LogisticFit {
        a,
        b,
        l,
        sse,
        rmse: (sse / t.len() as f64).sqrt(),
    })
}
