//! Definite integrals over a closed interval.
//!
//! Three backends, selected with [`Quadrature`]:
//!
//! | Backend | Tolerance | Notes |
//! |---|---|---|
//! | [`double_exponential`] | absolute | tanh-sinh; robust to endpoint singularities |
//! | [`gauss_legendre`] | none (fixed order) | one `n`-point rule |
//! | [`gauss_kronrod`] | relative | globally adaptive bisection |
//!
//! [`on_closed_interval`] is the common entry point. Callers that integrate
//! many times with one configuration should [`Quadrature::prepare`] once and
//! reuse the returned [`Integrator`]; a Gauss–Legendre rule, for one, is
//! then built a single time.

pub mod double_exponential;
pub mod gauss_kronrod;
pub mod gauss_legendre;

pub use gauss_kronrod::KronrodPoints;

use crate::error::{Error, Result};
use gauss_legendre::GaussLegendreRule;

/// Quadrature backend and its settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quadrature {
    /// Tanh-sinh until successive levels agree within an absolute error.
    DoubleExponential {
        /// Absolute error target (default `1e-10`).
        target_absolute_error: f64,
    },
    /// A single fixed-order Gauss–Legendre rule.
    GaussLegendre {
        /// Number of nodes (default 128).
        points: usize,
    },
    /// Adaptive Gauss–Kronrod until the error estimate meets a relative error.
    GaussKronrod {
        /// Relative error target (default `1e-10`).
        target_relative_error: f64,
        /// Rule size (default 15 points).
        points: KronrodPoints,
    },
}

impl Quadrature {
    /// Tanh-sinh with `target_absolute_error = 1e-10`.
    pub fn double_exponential() -> Self {
        Quadrature::DoubleExponential {
            target_absolute_error: 1e-10,
        }
    }

    /// 128-point Gauss–Legendre.
    pub fn gauss_legendre() -> Self {
        Quadrature::GaussLegendre { points: 128 }
    }

    /// 15-point Gauss–Kronrod with `target_relative_error = 1e-10`.
    pub fn gauss_kronrod() -> Self {
        Quadrature::GaussKronrod {
            target_relative_error: 1e-10,
            points: KronrodPoints::P15,
        }
    }

    /// Validates the settings and builds whatever tables the backend needs.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for a non-positive or non-finite error
    /// target, or a zero-point Gauss–Legendre rule.
    pub fn prepare(&self) -> Result<Integrator> {
        match *self {
            Quadrature::DoubleExponential {
                target_absolute_error,
            } => {
                check_target("target_absolute_error", target_absolute_error)?;
                Ok(Integrator::DoubleExponential {
                    target_absolute_error,
                })
            }
            Quadrature::GaussLegendre { points } => {
                Ok(Integrator::GaussLegendre(GaussLegendreRule::new(points)?))
            }
            Quadrature::GaussKronrod {
                target_relative_error,
                points,
            } => {
                check_target("target_relative_error", target_relative_error)?;
                gauss_kronrod::KronrodRule::get(points)?;
                Ok(Integrator::GaussKronrod {
                    target_relative_error,
                    points,
                })
            }
        }
    }
}

impl Default for Quadrature {
    fn default() -> Self {
        Quadrature::double_exponential()
    }
}

fn check_target(arg: &'static str, target: f64) -> Result<()> {
    if target.is_finite() && target > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(
            arg,
            format!("must be positive and finite, got {target}"),
        ))
    }
}

/// A validated [`Quadrature`] with its tables built.
#[derive(Debug, Clone, PartialEq)]
pub enum Integrator {
    /// See [`double_exponential::integrate`].
    DoubleExponential {
        /// Absolute error target.
        target_absolute_error: f64,
    },
    /// A prebuilt rule.
    GaussLegendre(GaussLegendreRule),
    /// See [`gauss_kronrod::integrate`].
    GaussKronrod {
        /// Relative error target.
        target_relative_error: f64,
        /// Rule size.
        points: KronrodPoints,
    },
}

impl Integrator {
    /// Integral of `f` over `[a, b]`.
    ///
    /// Equal bounds give exactly 0 without evaluating `f`; `a > b` gives
    /// the negated integral over `[b, a]`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for non-finite bounds;
    /// [`Error::NonConvergence`] from the adaptive backends.
    pub fn integrate<F>(&self, f: F, a: f64, b: f64) -> Result<f64>
    where
        F: Fn(f64) -> f64,
    {
        check_bound("a", a)?;
        check_bound("b", b)?;
        if a == b {
            return Ok(0.0);
        }
        if a > b {
            return self.integrate(f, b, a).map(|v| -v);
        }
        match self {
            Integrator::DoubleExponential {
                target_absolute_error,
            } => double_exponential::integrate(f, a, b, *target_absolute_error),
            Integrator::GaussLegendre(rule) => Ok(rule.integrate(f, a, b)),
            Integrator::GaussKronrod {
                target_relative_error,
                points,
            } => gauss_kronrod::integrate(f, a, b, *target_relative_error, *points),
        }
    }
}

fn check_bound(arg: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(
            arg,
            format!("integration bounds must be finite, got {value}"),
        ))
    }
}

/// Integral of `f` over `[a, b]` with the given backend.
///
/// # Errors
/// [`Error::InvalidArgument`] for invalid backend settings or non-finite
/// bounds, and
/// [`Error::NonConvergence`] when an adaptive backend runs out of budget.
///
/// # Examples
/// ```
/// use u_calculus::integrate::{on_closed_interval, Quadrature};
/// let v = on_closed_interval(|x: f64| x * x, 0.0, 3.0, &Quadrature::gauss_kronrod()).unwrap();
/// assert!((v - 9.0).abs() < 1e-9);
/// ```
pub fn on_closed_interval<F>(f: F, a: f64, b: f64, quadrature: &Quadrature) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    quadrature.prepare()?.integrate(f, a, b)
}
