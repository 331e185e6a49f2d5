//! Model evaluation for the exponential and logistic growth curves.
//!
//! The fitters rely on two primitive operations:
//! - predict `count(t)` given parameters (for residuals/plots)
//! - the partial derivatives with respect to the free parameters (for Levenberg-Marquardt)

/// `count(t) = a^(t - b)`.
pub fn exponential(t: f64, a: f64, b: f64) -> f64 {
    a.powf(t - b)
}

/// Partial derivatives of [`exponential`] with respect to `(a, b)`.
pub fn exponential_gradient(t: f64, a: f64, b: f64) -> [f64; 2] {
    let value = exponential(t, a, b);
    let d_a = (t - b) * a.powf(t - b - 1.0);
    let d_b = -a.ln() * value;
    [d_a, d_b]
}

/// The logistic curve divided by its asymptote: `1 / (1 + e^((1 - a)(t - b)))`.
///
/// The model is linear in `L`, so the fitter only needs this shape.
pub fn logistic_shape(t: f64, a: f64, b: f64) -> f64 {
    1.0 / (1.0 + ((1.0 - a) * (t - b)).exp())
}

/// `count(t) = L / (1 + e^((1 - a)(t - b)))`.
pub fn logistic(t: f64, a: f64, b: f64, l: f64) -> f64 {
    l * logistic_shape(t, a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_known_values() {
        assert!((exponential(3.0, 2.0, 0.0) - 8.0).abs() < 1e-12);
        assert!((exponential(5.0, 2.0, 5.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn exponential_gradient_matches_finite_differences() {
        let (t, a, b) = (7.0, 1.3, 2.5);
        let h = 1e-6;
        let [da, db] = exponential_gradient(t, a, b);
        let fd_a = (exponential(t, a + h, b) - exponential(t, a - h, b)) / (2.0 * h);
        let fd_b = (exponential(t, a, b + h) - exponential(t, a, b - h)) / (2.0 * h);
        assert!((da - fd_a).abs() < 1e-5, "d/da {da} vs {fd_a}");
        assert!((db - fd_b).abs() < 1e-5, "d/db {db} vs {fd_b}");
    }

    #[test]
    fn logistic_is_half_of_asymptote_at_inflection() {
        let y = logistic(40.0, 1.25, 40.0, 1000.0);
        assert!((y - 500.0).abs() < 1e-9);
        // Growth factor above one means the curve rises toward L.
        assert!(logistic(80.0, 1.25, 40.0, 1000.0) > 999.0);
        assert!(logistic(0.0, 1.25, 40.0, 1000.0) < 1.0);
    }
}
