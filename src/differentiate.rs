//! Finite-difference derivatives.
//!
//! A [`NumericalDerivative`] is a stencil of `points` equally spaced
//! samples with the evaluation point at index `center`. Weights for any
//! derivative order below `points` come from Fornberg's recursion, so the
//! same engine serves first, second and higher derivatives.
//!
//! The step defaults to `h = ε^(1/(order+2)) · (1 + |x|)`, which balances
//! the `O(h²)` truncation error of a central stencil against the
//! `O(ε / h^order)` rounding error.
//!
//! Reference: Fornberg (1988), "Generation of Finite Difference Formulas
//! on Arbitrarily Spaced Grids", *Mathematics of Computation* 51(184).

use std::convert::Infallible;

use crate::error::{Error, Result};

/// How the spacing between stencil samples is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StepSize {
    /// `h = ε^(1/(order+2)) · (1 + |x|)`.
    #[default]
    Relative,
    /// A fixed spacing.
    Absolute(f64),
}

/// Finite-difference derivative engine over a fixed stencil.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericalDerivative {
    points: usize,
    center: usize,
    step: StepSize,
}

impl NumericalDerivative {
    /// Creates an engine with `points` samples, the evaluation point at
    /// index `center`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `points < 2` or `center >= points`.
    pub fn new(points: usize, center: usize) -> Result<Self> {
        if points < 2 {
            return Err(Error::invalid(
                "points",
                format!("stencil needs at least 2 points, got {points}"),
            ));
        }
        if center >= points {
            return Err(Error::invalid(
                "center",
                format!("must be below points ({points}), got {center}"),
            ));
        }
        Ok(Self {
            points,
            center,
            step: StepSize::Relative,
        })
    }

    /// Central stencil sized for a derivative of `order`:
    /// `points = order + (1 if order is even else 2)`, `center = points / 2`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for `order == 0`.
    ///
    /// # Examples
    /// ```
    /// use u_calculus::differentiate::NumericalDerivative;
    /// let d = NumericalDerivative::for_order(3).unwrap();
    /// assert_eq!((d.points(), d.center()), (5, 2));
    /// ```
    pub fn for_order(order: usize) -> Result<Self> {
        if order == 0 {
            return Err(Error::invalid("order", "derivative order must be at least 1"));
        }
        Ok(Self::central(order))
    }

    fn central(order: usize) -> Self {
        let points = order + if order % 2 == 0 { 1 } else { 2 };
        Self {
            points,
            center: points / 2,
            step: StepSize::Relative,
        }
    }

    /// Replaces the step-size policy.
    pub fn with_step_size(mut self, step: StepSize) -> Self {
        self.step = step;
        self
    }

    /// Number of samples in the stencil.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Index of the evaluation point within the stencil.
    pub fn center(&self) -> usize {
        self.center
    }

    /// Stencil weights for a derivative of `order`, for unit spacing.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `order >= points`.
    ///
    /// # Examples
    /// ```
    /// use u_calculus::differentiate::NumericalDerivative;
    /// let d = NumericalDerivative::for_order(2).unwrap();
    /// let w = d.coefficients(2).unwrap();
    /// assert!((w[0] - 1.0).abs() < 1e-14 && (w[1] + 2.0).abs() < 1e-14);
    /// ```
    pub fn coefficients(&self, order: usize) -> Result<Vec<f64>> {
        self.check_order(order)?;
        Ok(self.weights(order))
    }

    /// Derivative of `f` of the given `order` at `x`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `order >= points`.
    pub fn evaluate_derivative<F>(&self, f: F, x: f64, order: usize) -> Result<f64>
    where
        F: Fn(f64) -> f64,
    {
        self.check_order(order)?;
        Ok(infallible(self.sample(|v| Ok(f(v)), x, order)))
    }

    /// Like [`evaluate_derivative`](Self::evaluate_derivative) for a
    /// function that can itself fail; the first error is returned as is.
    pub fn try_evaluate_derivative<F>(&self, f: F, x: f64, order: usize) -> Result<f64>
    where
        F: Fn(f64) -> Result<f64>,
    {
        self.check_order(order)?;
        self.sample(f, x, order)
    }

    fn check_order(&self, order: usize) -> Result<()> {
        if order >= self.points {
            return Err(Error::invalid(
                "order",
                format!(
                    "a {}-point stencil supports orders below {}, got {order}",
                    self.points, self.points
                ),
            ));
        }
        Ok(())
    }

    fn step_size(&self, x: f64, order: usize) -> f64 {
        let h = match self.step {
            StepSize::Relative => f64::EPSILON.powf(1.0 / (order as f64 + 2.0)) * (1.0 + x.abs()),
            StepSize::Absolute(h) => h,
        };
        // make x + h exactly representable
        (x + h) - x
    }

    fn sample<F, E>(&self, f: F, x: f64, order: usize) -> std::result::Result<f64, E>
    where
        F: Fn(f64) -> std::result::Result<f64, E>,
    {
        if order == 0 {
            return f(x);
        }
        let weights = self.weights(order);
        let h = self.step_size(x, order);
        let mut sum = 0.0;
        for (j, &w) in weights.iter().enumerate() {
            if w == 0.0 {
                continue;
            }
            let offset = j as f64 - self.center as f64;
            sum += w * f(x + offset * h)?;
        }
        Ok(sum / h.powi(order as i32))
    }

    /// Fornberg weights at 0 for the integer offsets `j - center`.
    fn weights(&self, order: usize) -> Vec<f64> {
        let nodes: Vec<f64> = (0..self.points)
            .map(|j| j as f64 - self.center as f64)
            .collect();
        fornberg_weights(&nodes, order)
    }
}

/// Finite-difference weights at 0 for the derivative of `order` on `nodes`.
fn fornberg_weights(nodes: &[f64], order: usize) -> Vec<f64> {
    let n = nodes.len();
    let mut c = vec![vec![0.0; order + 1]; n];
    c[0][0] = 1.0;
    let mut c1 = 1.0;
    let mut c4 = nodes[0];

    for i in 1..n {
        let mn = i.min(order);
        let mut c2 = 1.0;
        let c5 = c4;
        c4 = nodes[i];
        for j in 0..i {
            let c3 = nodes[i] - nodes[j];
            c2 *= c3;
            if j == i - 1 {
                for k in (1..=mn).rev() {
                    c[i][k] = c1 * (k as f64 * c[i - 1][k - 1] - c5 * c[i - 1][k]) / c2;
                }
                c[i][0] = -c1 * c5 * c[i - 1][0] / c2;
            }
            for k in (1..=mn).rev() {
                c[j][k] = (c4 * c[j][k] - k as f64 * c[j][k - 1]) / c3;
            }
            c[j][0] = c4 * c[j][0] / c3;
        }
        c1 = c2;
    }
    c.into_iter().map(|row| row[order]).collect()
}

fn infallible(r: std::result::Result<f64, Infallible>) -> f64 {
    match r {
        Ok(v) => v,
        Err(never) => match never {},
    }
}

/// First derivative of `f` at `x` (3-point central stencil).
///
/// # Examples
/// ```
/// use u_calculus::differentiate::first_derivative;
/// let d = first_derivative(|x: f64| x.sin(), 0.0);
/// assert!((d - 1.0).abs() < 1e-9);
/// ```
pub fn first_derivative<F>(f: F, x: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    infallible(NumericalDerivative::central(1).sample(|v| Ok(f(v)), x, 1))
}

/// Second derivative of `f` at `x` (3-point central stencil).
pub fn second_derivative<F>(f: F, x: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    infallible(NumericalDerivative::central(2).sample(|v| Ok(f(v)), x, 2))
}

/// Derivative of `f` of any positive `order` at `x`.
///
/// # Errors
/// [`Error::InvalidArgument`] for `order == 0`.
pub fn derivative<F>(f: F, x: f64, order: usize) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    NumericalDerivative::for_order(order)?.evaluate_derivative(f, x, order)
}

/// The derivative of `f` of the given `order`, as a function.
///
/// # Errors
/// [`Error::InvalidArgument`] for `order == 0`.
///
/// # Examples
/// ```
/// use u_calculus::differentiate::derivative_func;
/// let d2 = derivative_func(|x: f64| x.powi(3), 2).unwrap();
/// assert!((d2(2.0) - 12.0).abs() < 1e-6);
/// ```
pub fn derivative_func<F>(f: F, order: usize) -> Result<impl Fn(f64) -> f64>
where
    F: Fn(f64) -> f64,
{
    let engine = NumericalDerivative::for_order(order)?;
    let weights = engine.weights(order);
    Ok(move |x: f64| {
        let h = engine.step_size(x, order);
        let mut sum = 0.0;
        for (j, &w) in weights.iter().enumerate() {
            if w != 0.0 {
                sum += w * f(x + (j as f64 - engine.center as f64) * h);
            }
        }
        sum / h.powi(order as i32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_weights(got: &[f64], want: &[f64]) {
        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() < 1e-12, "weights {got:?} != {want:?}");
        }
    }

    // --- stencil construction ---

    #[test]
    fn test_for_order_stencil_sizes() {
        let sizes: Vec<(usize, usize)> = (1..=6)
            .map(|k| {
                let d = NumericalDerivative::for_order(k).unwrap();
                (d.points(), d.center())
            })
            .collect();
        assert_eq!(sizes, vec![(3, 1), (3, 1), (5, 2), (5, 2), (7, 3), (7, 3)]);
    }

    #[test]
    fn test_invalid_stencils() {
        assert!(NumericalDerivative::for_order(0).is_err());
        assert!(NumericalDerivative::new(1, 0).is_err());
        assert!(NumericalDerivative::new(3, 3).is_err());
        let d = NumericalDerivative::new(3, 1).unwrap();
        assert!(matches!(
            d.coefficients(3),
            Err(Error::InvalidArgument { arg: "order", .. })
        ));
        assert!(d.evaluate_derivative(|x| x, 0.0, 5).is_err());
    }

    // --- Fornberg weights ---

    #[test]
    fn test_central_weights() {
        let d1 = NumericalDerivative::for_order(1).unwrap();
        assert_weights(&d1.coefficients(1).unwrap(), &[-0.5, 0.0, 0.5]);
        assert_weights(&d1.coefficients(2).unwrap(), &[1.0, -2.0, 1.0]);

        let d3 = NumericalDerivative::for_order(3).unwrap();
        assert_weights(&d3.coefficients(3).unwrap(), &[-0.5, 1.0, 0.0, -1.0, 0.5]);
        assert_weights(&d3.coefficients(4).unwrap(), &[1.0, -4.0, 6.0, -4.0, 1.0]);
        assert_weights(
            &d3.coefficients(1).unwrap(),
            &[1.0 / 12.0, -2.0 / 3.0, 0.0, 2.0 / 3.0, -1.0 / 12.0],
        );
    }

    #[test]
    fn test_one_sided_weights() {
        // forward difference: f'(x) ≈ (-3f0 + 4f1 - f2) / 2h
        let d = NumericalDerivative::new(3, 0).unwrap();
        assert_weights(&d.coefficients(1).unwrap(), &[-1.5, 2.0, -0.5]);
    }

    #[test]
    fn test_weights_annihilate_constants() {
        for order in 1..=6 {
            let w = NumericalDerivative::for_order(order)
                .unwrap()
                .coefficients(order)
                .unwrap();
            let s: f64 = w.iter().sum();
            assert!(s.abs() < 1e-10, "order {order}: weights sum to {s}");
        }
    }

    // --- derivatives ---

    #[test]
    fn test_first_derivative_sin() {
        for &x in &[0.0, 1.0, -2.5, 10.0] {
            let d = first_derivative(|v: f64| v.sin(), x);
            assert!((d - x.cos()).abs() < 1e-9, "d/dx sin at {x}: {d}");
        }
    }

    #[test]
    fn test_second_derivative_sin() {
        let d = second_derivative(|v: f64| v.sin(), 1.0);
        assert!((d + 1.0_f64.sin()).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn test_higher_order_derivatives_of_exp() {
        let x = 0.5_f64;
        let e = x.exp();
        let d3 = derivative(|v: f64| v.exp(), x, 3).unwrap();
        assert!((d3 - e).abs() < 1e-5, "third derivative {d3}");
        let d4 = derivative(|v: f64| v.exp(), x, 4).unwrap();
        assert!((d4 - e).abs() < 1e-3, "fourth derivative {d4}");
    }

    #[test]
    fn test_polynomial_derivatives_are_exact_up_to_rounding() {
        // a 3-point central stencil is exact for quadratics
        let f = |v: f64| 3.0 * v * v - 2.0 * v + 7.0;
        let d = first_derivative(f, 2.0);
        assert!((d - 10.0).abs() < 1e-8);
        let d2 = second_derivative(f, 2.0);
        assert!((d2 - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_absolute_step() {
        let d = NumericalDerivative::for_order(1)
            .unwrap()
            .with_step_size(StepSize::Absolute(1e-3));
        let v = d.evaluate_derivative(|x: f64| x.exp(), 0.0, 1).unwrap();
        // central difference error ≈ h²/6
        assert!((v - 1.0).abs() < 2e-7 && (v - 1.0).abs() > 1e-8, "got {v}");
    }

    #[test]
    fn test_order_zero_returns_value() {
        let d = NumericalDerivative::for_order(1).unwrap();
        assert_eq!(d.evaluate_derivative(|x: f64| x.cos(), 0.3, 0).unwrap(), 0.3_f64.cos());
    }

    #[test]
    fn test_try_evaluate_propagates_errors() {
        let d = NumericalDerivative::for_order(1).unwrap();
        let err = d
            .try_evaluate_derivative(
                |x| {
                    if x > 1.0 {
                        Err(Error::non_convergence("probe"))
                    } else {
                        Ok(x)
                    }
                },
                1.0,
                1,
            )
            .unwrap_err();
        assert_eq!(err, Error::non_convergence("probe"));
    }

    #[test]
    fn test_derivative_func_matches_direct_evaluation() {
        let f = |x: f64| x.ln();
        let df = derivative_func(f, 1).unwrap();
        for &x in &[0.5, 1.0, 3.0] {
            assert_eq!(df(x), first_derivative(f, x));
        }
        assert!(derivative_func(f, 0).is_err());
    }
}
