//! Levenberg-Marquardt nonlinear least squares.
//!
//! Minimizes `sum_i r_i(p)^2` for a residual vector `r(p)` with Jacobian `J(p)`:
//!
//! ```text
//! (J^T J + lambda * D) delta = -J^T r
//! ```
//!
//! where `D` is the diagonal of `J^T J` (Marquardt scaling). A step is accepted
//! when it lowers the SSE; `lambda` shrinks after accepted steps and grows
//! after rejected ones.
//!
//! Convergence follows the MINPACK tests: relative SSE reduction below
//! `ftol`, relative step size below `xtol`, or a vanishing gradient. The
//! evaluation cap defaults to MINPACK's `200 * (n + 1)`.

use nalgebra::{DMatrix, DVector};

/// A least squares problem in a fixed number of parameters.
pub trait LeastSquaresProblem {
    fn n_params(&self) -> usize;

    /// Residuals `model(p) - observed`, one per observation.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// Jacobian of the residuals, `n_obs x n_params`.
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

#[derive(Debug, Clone)]
pub struct LmOptions {
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    /// Maximum residual evaluations; `None` uses `200 * (n_params + 1)`.
    pub max_evaluations: Option<usize>,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            max_evaluations: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: DVector<f64>,
    pub sse: f64,
    pub iterations: usize,
    pub evaluations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LmFailure {
    /// The residuals at the starting point are not finite.
    NonFiniteStart,
    /// The evaluation budget ran out before any convergence test passed.
    MaxEvaluations(usize),
    /// Damping grew without bound and no step could be taken.
    Stalled,
}

impl std::fmt::Display for LmFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LmFailure::NonFiniteStart => write!(f, "non-finite residuals at the initial guess"),
            LmFailure::MaxEvaluations(n) => {
                write!(f, "optimal parameters not found: number of evaluations exceeded {n}")
            }
            LmFailure::Stalled => write!(f, "damping diverged without finding a descent step"),
        }
    }
}

const LAMBDA_MAX: f64 = 1e32;

/// Run Levenberg-Marquardt from `initial`.
pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmOutcome, LmFailure> {
    let n = problem.n_params();
    let max_evals = opts.max_evaluations.unwrap_or(200 * (n + 1));

    let mut params = initial;
    let mut residuals = problem.residuals(&params);
    let mut evaluations = 1usize;
    let mut sse = residuals.norm_squared();
    if !sse.is_finite() {
        return Err(LmFailure::NonFiniteStart);
    }

    let mut lambda: Option<f64> = None;
    let mut nu = 2.0;
    let mut iterations = 0usize;

    loop {
        if sse == 0.0 {
            break;
        }

        let jac = problem.jacobian(&params);
        let jtj = jac.transpose() * &jac;
        let gradient = jac.transpose() * &residuals;

        if gradient.amax() <= opts.gtol {
            break;
        }

        // Scale the damping by the curvature so lambda is unit-free.
        let diag: Vec<f64> = (0..n).map(|i| jtj[(i, i)].max(f64::MIN_POSITIVE)).collect();
        let mut damping = lambda.unwrap_or(1e-3);

        let mut accepted = false;
        let mut converged = false;
        while !accepted {
            if evaluations >= max_evals {
                return Err(LmFailure::MaxEvaluations(max_evals));
            }
            if damping > LAMBDA_MAX {
                return Err(LmFailure::Stalled);
            }

            let mut system = jtj.clone();
            for (i, d) in diag.iter().enumerate() {
                system[(i, i)] += damping * d;
            }

            let Some(step) = system.cholesky().map(|c| c.solve(&(-&gradient))) else {
                damping *= nu;
                nu *= 2.0;
                continue;
            };

            let step_norm = step.norm();
            let small_step = step_norm <= opts.xtol * (params.norm() + opts.xtol);

            let candidate = &params + &step;
            let candidate_residuals = problem.residuals(&candidate);
            evaluations += 1;
            let candidate_sse = candidate_residuals.norm_squared();

            if candidate_sse.is_finite() && candidate_sse < sse {
                let reduction = (sse - candidate_sse) / sse;
                params = candidate;
                residuals = candidate_residuals;
                sse = candidate_sse;
                damping = (damping / 3.0).max(1e-15);
                nu = 2.0;
                accepted = true;
                converged = reduction <= opts.ftol || small_step;
            } else if small_step {
                // Steps have shrunk below resolution without improving: we are
                // sitting on the minimum.
                converged = true;
                break;
            } else {
                damping *= nu;
                nu *= 2.0;
            }
        }

        iterations += 1;
        lambda = Some(damping);
        if converged {
            break;
        }
    }

    Ok(LmOutcome {
        params,
        sse,
        iterations,
        evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = p0 * exp(p1 * x)
    struct ExpDecay {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for ExpDecay {
        fn n_params(&self) -> usize {
            2
        }

        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x
                    .iter()
                    .zip(&self.y)
                    .map(|(&x, &y)| p[0] * (p[1] * x).exp() - y),
            )
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            let mut j = DMatrix::zeros(self.x.len(), 2);
            for (i, &x) in self.x.iter().enumerate() {
                let e = (p[1] * x).exp();
                j[(i, 0)] = e;
                j[(i, 1)] = p[0] * x * e;
            }
            j
        }
    }

    #[test]
    fn recovers_parameters_from_exact_data() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|&x| 3.0 * (-0.7 * x).exp()).collect();
        let problem = ExpDecay { x, y };

        let out = levenberg_marquardt(&problem, DVector::from_row_slice(&[1.0, -0.1]), &LmOptions::default())
            .unwrap();
        assert!((out.params[0] - 3.0).abs() < 1e-6, "p0 = {}", out.params[0]);
        assert!((out.params[1] + 0.7).abs() < 1e-6, "p1 = {}", out.params[1]);
        assert!(out.sse < 1e-10);
    }

    #[test]
    fn exact_start_converges_immediately() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&x| 2.0 * (0.1 * x).exp()).collect();
        let problem = ExpDecay { x, y };

        let out = levenberg_marquardt(&problem, DVector::from_row_slice(&[2.0, 0.1]), &LmOptions::default())
            .unwrap();
        assert!((out.params[0] - 2.0).abs() < 1e-9);
        assert!(out.iterations <= 2);
    }

    #[test]
    fn evaluation_budget_is_enforced() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|&x| 3.0 * (-0.7 * x).exp()).collect();
        let problem = ExpDecay { x, y };
        let opts = LmOptions {
            max_evaluations: Some(2),
            ..LmOptions::default()
        };

        let err = levenberg_marquardt(&problem, DVector::from_row_slice(&[1.0, 0.5]), &opts).unwrap_err();
        assert_eq!(err, LmFailure::MaxEvaluations(2));
    }

    #[test]
    fn non_finite_start_is_reported() {
        let problem = ExpDecay {
            x: vec![1.0, 2.0],
            y: vec![1.0, 2.0],
        };
        let err = levenberg_marquardt(
            &problem,
            DVector::from_row_slice(&[1.0, f64::INFINITY]),
            &LmOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, LmFailure::NonFiniteStart);
    }
}
