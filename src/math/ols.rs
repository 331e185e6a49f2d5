//! Linear least squares solver.
//!
//! Two places in the pipeline reduce to a small linear problem
//! `minimize ||X beta - y||^2`:
//!
//! - the log-linear regression that seeds the exponential fit
//! - the logistic fit, which is linear in its only free parameter `L`
//!
//! Both have tall design matrices (one row per day, one or two columns), so we
//! solve through the SVD, which handles non-square systems and rank deficiency.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.nrows() != y.len() {
        return None;
    }

    let svd = x.clone().svd(true, true);

    // Loosen the singular value cutoff before giving up on a nearly
    // rank-deficient design.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
