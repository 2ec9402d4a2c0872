//! Fixed-order Gauss–Legendre quadrature.
//!
//! Nodes are the roots of `P_n`, found by Newton iteration on the
//! three-term Legendre recurrence from the Tricomi-style initial guess
//! `cos(π(i + 0.75) / (n + 0.5))`. An `n`-point rule integrates
//! polynomials up to degree `2n - 1` exactly.
//!
//! Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §4.6.

use std::f64::consts::PI;

use crate::error::{Error, Result};

const NEWTON_TOLERANCE: f64 = 1e-15;
const NEWTON_MAX_ITER: usize = 100;

/// Nodes and weights of an `n`-point Gauss–Legendre rule on `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussLegendreRule {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendreRule {
    /// Builds the `points`-point rule.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for `points == 0`.
    ///
    /// # Examples
    /// ```
    /// use u_calculus::integrate::gauss_legendre::GaussLegendreRule;
    /// let rule = GaussLegendreRule::new(2).unwrap();
    /// let x = 1.0 / 3.0_f64.sqrt();
    /// assert!((rule.nodes()[1] - x).abs() < 1e-15);
    /// ```
    pub fn new(points: usize) -> Result<Self> {
        if points == 0 {
            return Err(Error::invalid("points", "Gauss-Legendre rule needs at least 1 point"));
        }
        let n = points;
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];

        // roots are symmetric: solve for the positive half only
        for i in 0..n.div_ceil(2) {
            let mut z = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
            for _ in 0..NEWTON_MAX_ITER {
                let (p, dp) = legendre_with_derivative(n, z);
                let previous = z;
                z = previous - p / dp;
                if (z - previous).abs() <= NEWTON_TOLERANCE {
                    break;
                }
            }
            let dp = legendre_with_derivative(n, z).1;
            let w = 2.0 / ((1.0 - z * z) * dp * dp);
            nodes[i] = -z;
            nodes[n - 1 - i] = z;
            weights[i] = w;
            weights[n - 1 - i] = w;
        }

        Ok(Self { nodes, weights })
    }

    /// Nodes on `[-1, 1]`, ascending.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Weights aligned with [`nodes`](Self::nodes).
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a rule has at least one point.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Applies the rule to `f` on `[a, b]`. Reversed bounds give the
    /// negated integral.
    pub fn integrate<F>(&self, f: F, a: f64, b: f64) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let center = 0.5 * (a + b);
        let half = 0.5 * (b - a);
        let sum: f64 = self
            .nodes
            .iter()
            .zip(&self.weights)
            .map(|(&x, &w)| w * f(center + half * x))
            .sum();
        half * sum
    }
}

/// `(P_n(x), P_n'(x))` by the three-term recurrence.
///
/// The derivative uses `(x² - 1) P_n' = n (x P_n - P_{n-1})`, so it is
/// only meaningful for `|x| < 1`.
pub(crate) fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for j in 0..n {
        let p3 = p2;
        p2 = p1;
        p1 = ((2 * j + 1) as f64 * x * p2 - j as f64 * p3) / (j + 1) as f64;
    }
    let dp = n as f64 * (x * p1 - p2) / (x * x - 1.0);
    (p1, dp)
}

/// `[P_0(x), ..., P_n(x)]`.
pub(crate) fn legendre_table(n: usize, x: f64) -> Vec<f64> {
    let mut p = Vec::with_capacity(n + 1);
    p.push(1.0);
    if n >= 1 {
        p.push(x);
    }
    for j in 1..n {
        let next = ((2 * j + 1) as f64 * x * p[j] - j as f64 * p[j - 1]) / (j + 1) as f64;
        p.push(next);
    }
    p
}
