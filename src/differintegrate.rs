//! Riemann–Liouville differintegrals of arbitrary real order.
//!
//! For `order = q` and lower terminal `x0`,
//!
//! ```text
//! D^q f(x) = 1/Γ(m - q) · d^m/dx^m ∫_{x0}^{x} (x - t)^{m - q - 1} f(t) dt,
//! m = max(⌈q⌉ + 1, 1)
//! ```
//!
//! The exponent `m - q - 1` is never negative, so the inner integrand is
//! bounded whenever `f` is. The inner integral goes to the chosen
//! [`Quadrature`] backend and the outer `m`-th derivative to a central
//! finite-difference stencil.
//!
//! Two orders bypass quadrature: `|q| < ε` returns `f(x)`, and a positive
//! integer `q` is an ordinary finite-difference derivative. Stencil points
//! at or below `x0` see an inner integral of 0, i.e. `f` is treated as
//! vanishing before the lower terminal.

use tracing::trace;

use crate::differentiate::NumericalDerivative;
use crate::error::{Error, Result};
use crate::integrate::Quadrature;
use crate::special::gamma;

/// Highest positive order; the outer derivative needs a stencil of about
/// `order + 2` points.
pub const MAX_ORDER: f64 = 32.0;

/// Differintegral of `f` of real `order` at `x`, with lower terminal `x0`.
///
/// Positive orders differentiate, negative orders integrate.
///
/// # Errors
/// - [`Error::OutOfRange`] for `x < x0` at non-integer or negative orders
/// - [`Error::InvalidArgument`] for non-finite `x`, `order` or `x0`, an
///   order above [`MAX_ORDER`], and invalid quadrature settings
/// - [`Error::NonConvergence`] when the quadrature backend runs out of
///   budget at any stencil point
///
/// # Examples
/// ```
/// use u_calculus::differintegrate::differintegrate;
/// use u_calculus::integrate::Quadrature;
///
/// // half-derivative of t at x = 1: 2·sqrt(1/π)
/// let v = differintegrate(|t| t, 1.0, 0.5, 0.0, &Quadrature::double_exponential()).unwrap();
/// assert!((v - 2.0 / std::f64::consts::PI.sqrt()).abs() < 1e-4);
/// ```
pub fn differintegrate<F>(f: F, x: f64, order: f64, x0: f64, quadrature: &Quadrature) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    check_finite("x", x)?;
    check_finite("order", order)?;
    check_finite("x0", x0)?;
    if order > MAX_ORDER {
        return Err(Error::invalid(
            "order",
            format!("orders above {MAX_ORDER} are not supported, got {order}"),
        ));
    }

    if order.abs() < f64::EPSILON {
        trace!(x, "differintegral of order 0 is the function value");
        return Ok(f(x));
    }

    let rounded = order.round();
    if rounded >= 1.0 && (order - rounded).abs() < f64::EPSILON {
        let n = rounded as usize;
        trace!(x, n, "integer order: plain finite-difference derivative");
        return NumericalDerivative::for_order(n)?.evaluate_derivative(f, x, n);
    }

    if x < x0 {
        return Err(Error::OutOfRange {
            arg: "x",
            value: x,
            reason: "must not lie below the lower terminal x0",
        });
    }

    let m = (order.ceil() + 1.0).max(1.0) as usize;
    let exponent = m as f64 - order - 1.0;
    trace!(x, order, m, exponent, "fractional order: quadrature then differentiation");

    let integrator = quadrature.prepare()?;
    let inner = |v: f64| -> Result<f64> {
        if v <= x0 {
            return Ok(0.0);
        }
        integrator.integrate(|t| (v - t).powf(exponent) * f(t), x0, v)
    };
    let derivative = NumericalDerivative::for_order(m)?.try_evaluate_derivative(inner, x, m)?;
    Ok(derivative / gamma(m as f64 - order))
}

/// [`differintegrate`] at every point of `xs`, results in input order.
///
/// Points are evaluated in parallel with the `parallel` feature. The first
/// error (in input order) is returned.
///
/// # Examples
/// ```
/// use u_calculus::differintegrate::differintegrate_batch;
/// use u_calculus::integrate::Quadrature;
///
/// let xs = [1.0, 2.0, 3.0];
/// // order -1 integrates once: x²/2
/// let ys = differintegrate_batch(|t| t, &xs, -1.0, 0.0, &Quadrature::gauss_legendre()).unwrap();
/// for (x, y) in xs.iter().zip(&ys) {
///     assert!((y - x * x / 2.0).abs() < 1e-6);
/// }
/// ```
pub fn differintegrate_batch<F>(
    f: F,
    xs: &[f64],
    order: f64,
    x0: f64,
    quadrature: &Quadrature,
) -> Result<Vec<f64>>
where
    F: Fn(f64) -> f64 + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let results: Vec<Result<f64>> = xs
            .par_iter()
            .map(|&x| differintegrate(&f, x, order, x0, quadrature))
            .collect();
        results.into_iter().collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        xs.iter()
            .map(|&x| differintegrate(&f, x, order, x0, quadrature))
            .collect()
    }
}

fn check_finite(arg: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(arg, format!("must be finite, got {value}")))
    }
}
