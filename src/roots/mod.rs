//! Scalar root finding with algorithm fallback.
//!
//! The facades here try an ordered list of strategies and return the first
//! root that converges. Each strategy reports a [`RootOutcome`] instead of
//! failing; only after the last one gives up is [`Error::NonConvergence`]
//! raised.
//!
//! | Facade | Primary | Fallback |
//! |---|---|---|
//! | [`of_function`] | [`brent`] | [`bisection`] |
//! | [`of_function_derivative`] | [`newton`] (bracket-safeguarded) | [`bisection`] |
//!
//! The polynomial solvers [`quadratic`] and [`cubic`] take their
//! coefficients in ascending order of exponent: constant term first.

pub mod bisection;
pub mod brent;
pub mod newton;

use num_complex::Complex64;
use tracing::debug;

use crate::error::{Error, Result};

/// Sub-intervals scanned by the Newton strategy when the bounds share a sign.
pub const NEWTON_SUBDIVISIONS: usize = 20;

const OPERATION: &str = "root finding";

/// Result of a single root-finding strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RootOutcome {
    /// The strategy met its tolerance at this point.
    Converged(f64),
    /// The strategy could not produce a root within its budget.
    Failed,
}

impl RootOutcome {
    /// The root, if the strategy converged.
    pub fn root(self) -> Option<f64> {
        match self {
            RootOutcome::Converged(root) => Some(root),
            RootOutcome::Failed => None,
        }
    }
}

/// Accuracy and iteration budget shared by every strategy of one call.
///
/// Each strategy gets the full `max_iterations`; attempts do not share a
/// count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOptions {
    /// Target accuracy on the root.
    pub accuracy: f64,
    /// Maximum iterations per strategy.
    pub max_iterations: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            accuracy: 1e-8,
            max_iterations: 100,
        }
    }
}

impl RootOptions {
    fn validate(&self, lower: f64, upper: f64) -> Result<()> {
        if !(self.accuracy.is_finite() && self.accuracy > 0.0) {
            return Err(Error::invalid(
                "accuracy",
                format!("must be positive and finite, got {}", self.accuracy),
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid("max_iterations", "must be at least 1"));
        }
        if !lower.is_finite() || !upper.is_finite() {
            return Err(Error::invalid(
                "bounds",
                format!("must be finite, got [{lower}, {upper}]"),
            ));
        }
        Ok(())
    }
}

type Strategy<'a> = (&'static str, &'a dyn Fn() -> RootOutcome);

/// Runs `strategies` in order and returns the first converged root.
fn first_converged(strategies: &[Strategy<'_>]) -> Result<f64> {
    for (i, (name, attempt)) in strategies.iter().enumerate() {
        match attempt() {
            RootOutcome::Converged(root) => return Ok(root),
            RootOutcome::Failed => debug!(
                strategy = *name,
                remaining = strategies.len() - i - 1,
                "root strategy failed"
            ),
        }
    }
    Err(Error::non_convergence(OPERATION))
}

/// Finds a root of `f` in `[lower, upper]`.
///
/// Tries Brent's method first, then bisection with the same bounds,
/// accuracy and iteration budget. The bounds should bracket a sign change;
/// this is not checked up front, the strategies simply fail without one.
///
/// # Errors
/// - [`Error::NonConvergence`] when both strategies fail.
/// - [`Error::InvalidArgument`] for a non-positive accuracy, a zero
///   iteration budget or non-finite bounds.
///
/// # Examples
/// ```
/// use u_calculus::roots::{of_function, RootOptions};
/// let root = of_function(|x| x * x - 2.0, 0.0, 2.0, RootOptions::default()).unwrap();
/// assert!((root - std::f64::consts::SQRT_2).abs() < 1e-8);
/// ```
pub fn of_function<F>(f: F, lower: f64, upper: f64, options: RootOptions) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    options.validate(lower, upper)?;
    let RootOptions {
        accuracy,
        max_iterations,
    } = options;

    let fast = || brent::find_root(&f, lower, upper, accuracy, max_iterations);
    let fallback = || bisection::find_root(&f, lower, upper, accuracy, max_iterations);
    let strategies: [Strategy<'_>; 2] = [("brent", &fast), ("bisection", &fallback)];
    first_converged(&strategies)
}

/// Finds a root of `f` in `[lower, upper]` using its derivative `df`.
///
/// Tries the bracket-safeguarded Newton–Raphson method first (scanning
/// [`NEWTON_SUBDIVISIONS`] pieces when the bounds share a sign), then
/// bisection.
///
/// # Errors
/// Same as [`of_function`].
///
/// # Examples
/// ```
/// use u_calculus::roots::{of_function_derivative, RootOptions};
/// let root = of_function_derivative(
///     |x| x * x * x - x - 2.0,
///     |x| 3.0 * x * x - 1.0,
///     1.0,
///     2.0,
///     RootOptions::default(),
/// )
/// .unwrap();
/// assert!((root - 1.5213797).abs() < 1e-7);
/// ```
pub fn of_function_derivative<F, D>(
    f: F,
    df: D,
    lower: f64,
    upper: f64,
    options: RootOptions,
) -> Result<f64>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    options.validate(lower, upper)?;
    let RootOptions {
        accuracy,
        max_iterations,
    } = options;

    let fast = || {
        newton::find_root(
            &f,
            &df,
            lower,
            upper,
            accuracy,
            max_iterations,
            NEWTON_SUBDIVISIONS,
        )
    };
    let fallback = || bisection::find_root(&f, lower, upper, accuracy, max_iterations);
    let strategies: [Strategy<'_>; 2] = [("robust_newton", &fast), ("bisection", &fallback)];
    first_converged(&strategies)
}

/// Roots of `a·x² + b·x + c = 0` over the complex numbers.
///
/// Coefficients are given constant term first: `quadratic(c, b, a)`.
///
/// # Algorithm
/// For `b ≠ 0` the first root uses the branch of the quadratic formula
/// whose square-root term has the sign of `b`,
/// `q = −(b + sign(b)·√(b² − 4ac)) / 2`, `x₁ = q / a`, and the second comes
/// from Vieta, `x₂ = c / (a·x₁) = c / q`. This avoids subtracting nearly
/// equal numbers. For `b = 0` the roots are `±√(−c/a)`.
///
/// Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §5.6.
///
/// # Examples
/// ```
/// use u_calculus::roots::quadratic;
/// // x² - 3x + 2 = (x - 1)(x - 2)
/// let (r1, r2) = quadratic(2.0, -3.0, 1.0);
/// assert!((r1.re - 2.0).abs() < 1e-15 && r1.im == 0.0);
/// assert!((r2.re - 1.0).abs() < 1e-15 && r2.im == 0.0);
/// ```
pub fn quadratic(c: f64, b: f64, a: f64) -> (Complex64, Complex64) {
    if b == 0.0 {
        let t = Complex64::new(-c / a, 0.0).sqrt();
        return (t, -t);
    }

    let sqrt_disc = Complex64::new(b * b - 4.0 * a * c, 0.0).sqrt();
    let q = if b > 0.0 {
        -0.5 * (b + sqrt_disc)
    } else {
        -0.5 * (b - sqrt_disc)
    };
    (q / a, c / q)
}

/// Roots of `a·x³ + b·x² + c·x + d = 0` over the complex numbers.
///
/// Coefficients are given constant term first: `cubic(d, c, b, a)`.
///
/// # Algorithm
/// Cardano's formula on the monic cubic, with the cube-root branch chosen
/// so that its argument has the larger magnitude and the second cube root
/// tied to the first through `S·T = −Q`.
///
/// # Examples
/// ```
/// use u_calculus::roots::cubic;
/// // x³ - 1: one real root, two complex conjugates
/// let (r1, _, _) = cubic(-1.0, 0.0, 0.0, 1.0);
/// assert!((r1.re - 1.0).abs() < 1e-14 && r1.im.abs() < 1e-14);
/// ```
pub fn cubic(d: f64, c: f64, b: f64, a: f64) -> (Complex64, Complex64, Complex64) {
    let a2 = b / a;
    let a1 = c / a;
    let a0 = d / a;

    let q = (3.0 * a1 - a2 * a2) / 9.0;
    let r = (9.0 * a2 * a1 - 27.0 * a0 - 2.0 * a2 * a2 * a2) / 54.0;
    let sqrt_disc = Complex64::new(q * q * q + r * r, 0.0).sqrt();

    let w = if r >= 0.0 {
        r + sqrt_disc
    } else {
        r - sqrt_disc
    };
    let s = w.cbrt();
    let t = if s == Complex64::new(0.0, 0.0) {
        s
    } else {
        -q / s
    };

    let shift = a2 / 3.0;
    let sum = s + t;
    let diff = (s - t) * Complex64::new(0.0, 3.0_f64.sqrt() / 2.0);

    (
        sum - shift,
        -0.5 * sum - shift + diff,
        -0.5 * sum - shift - diff,
    )
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn quadratic_vieta_relations(
            c in -10.0_f64..10.0,
            b in -10.0_f64..10.0,
            a in prop_oneof![-10.0_f64..-0.1, 0.1_f64..10.0],
        ) {
            prop_assume!(b.abs() > 1e-3);
            let (r1, r2) = quadratic(c, b, a);

            for r in [r1, r2] {
                let residual = (r * r * a + r * b + c).norm();
                let scale = a.abs() * r.norm_sqr() + b.abs() * r.norm() + c.abs();
                prop_assert!(residual <= 1e-12 * scale.max(1e-300), "residual {residual} at {r}");
            }

            let sum = r1 + r2 + b / a;
            prop_assert!(sum.norm() <= 1e-12 * (r1.norm() + r2.norm() + (b / a).abs()));
            let product = r1 * r2 - c / a;
            prop_assert!(product.norm() <= 1e-12 * (r1.norm() * r2.norm() + (c / a).abs()).max(1e-300));
        }

        #[test]
        fn of_function_finds_shifted_cube_root(shift in -5.0_f64..5.0) {
            let f = |x: f64| (x - shift).powi(3) + (x - shift);
            let root = of_function(f, -10.0, 10.0, RootOptions::default()).unwrap();
            prop_assert!((root - shift).abs() < 1e-8, "root {root} != {shift}");
        }
    }
}
