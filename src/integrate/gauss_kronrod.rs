//! Adaptive Gauss–Kronrod quadrature.
//!
//! A `(2n+1)`-point Kronrod rule reuses the `n` Gauss–Legendre nodes and
//! adds `n+1` nodes at the roots of the Stieltjes polynomial `E_{n+1}`,
//! giving an integral estimate (Kronrod) and an error estimate
//! (`|Kronrod - Gauss|`) from one set of evaluations.
//!
//! The six supported rules are built once per process: `E_{n+1}` is found
//! in the Legendre basis from its orthogonality conditions, its roots are
//! bracketed between consecutive Gauss nodes, and the Kronrod weights
//! follow from matching the Legendre moments up to degree `2n`.
//!
//! Integration is globally adaptive: the segment with the largest error
//! estimate is bisected until the summed error meets the tolerance or
//! [`MAX_SEGMENTS`] is reached.
//!
//! Reference: Piessens et al. (1983), *QUADPACK*, §2.2; Laurie (1997),
//! "Calculation of Gauss-Kronrod quadrature rules", *Mathematics of
//! Computation* 66(219).

use once_cell::sync::Lazy;
use tracing::debug;

use super::gauss_legendre::{legendre_table, GaussLegendreRule};
use crate::error::{Error, Result};
use crate::roots::{bisection, brent};

const OPERATION: &str = "Gauss-Kronrod quadrature";

/// Segment budget of one adaptive integration.
pub const MAX_SEGMENTS: usize = 500;

/// Multiple of `ε · ∫|f|` below which the error estimate is rounding noise.
const ROUNDOFF_FACTOR: f64 = 50.0;

const NODE_MAX_ITER: usize = 200;

/// Supported Kronrod rule sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KronrodPoints {
    /// 7 Gauss + 8 Kronrod nodes.
    #[default]
    P15,
    /// 10 Gauss + 11 Kronrod nodes.
    P21,
    /// 15 Gauss + 16 Kronrod nodes.
    P31,
    /// 20 Gauss + 21 Kronrod nodes.
    P41,
    /// 25 Gauss + 26 Kronrod nodes.
    P51,
    /// 30 Gauss + 31 Kronrod nodes.
    P61,
}

impl KronrodPoints {
    /// Every supported size, smallest first.
    pub const ALL: [KronrodPoints; 6] = [
        KronrodPoints::P15,
        KronrodPoints::P21,
        KronrodPoints::P31,
        KronrodPoints::P41,
        KronrodPoints::P51,
        KronrodPoints::P61,
    ];

    /// Total number of nodes.
    pub fn count(self) -> usize {
        match self {
            KronrodPoints::P15 => 15,
            KronrodPoints::P21 => 21,
            KronrodPoints::P31 => 31,
            KronrodPoints::P41 => 41,
            KronrodPoints::P51 => 51,
            KronrodPoints::P61 => 61,
        }
    }

    /// Number of embedded Gauss nodes.
    pub fn gauss_points(self) -> usize {
        (self.count() - 1) / 2
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for KronrodPoints {
    type Error = Error;

    fn try_from(points: usize) -> Result<Self> {
        KronrodPoints::ALL
            .into_iter()
            .find(|p| p.count() == points)
            .ok_or_else(|| {
                Error::invalid(
                    "points",
                    format!("Gauss-Kronrod supports 15, 21, 31, 41, 51 or 61 points, got {points}"),
                )
            })
    }
}

/// Nodes and weights of one Kronrod rule on `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KronrodRule {
    nodes: Vec<f64>,
    kronrod_weights: Vec<f64>,
    gauss_weights: Vec<f64>,
}

static RULES: Lazy<Vec<Result<KronrodRule>>> = Lazy::new(|| {
    KronrodPoints::ALL
        .iter()
        .map(|p| KronrodRule::build(p.gauss_points()))
        .collect()
});

/// One bisection segment with its Kronrod estimate.
#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    estimate: f64,
    error: f64,
    magnitude: f64,
}

impl KronrodRule {
    /// The shared rule of the given size.
    ///
    /// # Examples
    /// ```
    /// use u_calculus::integrate::gauss_kronrod::{KronrodPoints, KronrodRule};
    /// let rule = KronrodRule::get(KronrodPoints::P15).unwrap();
    /// assert_eq!(rule.nodes().len(), 15);
    /// ```
    pub fn get(points: KronrodPoints) -> Result<&'static KronrodRule> {
        match &RULES[points.index()] {
            Ok(rule) => Ok(rule),
            Err(e) => Err(e.clone()),
        }
    }

    /// All `2n+1` nodes, ascending. Gauss nodes sit at the odd indices.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Kronrod weights aligned with [`nodes`](Self::nodes).
    pub fn kronrod_weights(&self) -> &[f64] {
        &self.kronrod_weights
    }

    /// Gauss weights aligned with [`nodes`](Self::nodes); zero at the
    /// Kronrod-only nodes.
    pub fn gauss_weights(&self) -> &[f64] {
        &self.gauss_weights
    }

    fn build(n: usize) -> Result<Self> {
        let gauss = GaussLegendreRule::new(n)?;
        let stieltjes = stieltjes_coefficients(n)?;
        let e = |x: f64| -> f64 {
            legendre_table(n + 1, x)
                .iter()
                .zip(&stieltjes)
                .map(|(p, c)| p * c)
                .sum()
        };

        let mut brackets = Vec::with_capacity(n + 2);
        brackets.push(-1.0);
        brackets.extend_from_slice(gauss.nodes());
        brackets.push(1.0);

        let mut nodes = Vec::with_capacity(2 * n + 1);
        let mut gauss_weights = Vec::with_capacity(2 * n + 1);
        for i in 0..=n {
            let (lo, hi) = (brackets[i], brackets[i + 1]);
            let root = brent::find_root(&e, lo, hi, f64::EPSILON, NODE_MAX_ITER)
                .root()
                .or_else(|| bisection::find_root(&e, lo, hi, f64::EPSILON, NODE_MAX_ITER).root())
                .ok_or_else(|| Error::non_convergence("Kronrod node construction"))?;
            nodes.push(root);
            gauss_weights.push(0.0);
            if i < n {
                nodes.push(gauss.nodes()[i]);
                gauss_weights.push(gauss.weights()[i]);
            }
        }
        symmetrize(&mut nodes, -1.0);

        let mut kronrod_weights = moment_weights(&nodes)?;
        symmetrize(&mut kronrod_weights, 1.0);

        Ok(Self {
            nodes,
            kronrod_weights,
            gauss_weights,
        })
    }

    fn apply<F>(&self, f: &F, a: f64, b: f64) -> Segment
    where
        F: Fn(f64) -> f64,
    {
        let center = 0.5 * (a + b);
        let half = 0.5 * (b - a);
        let (mut kronrod, mut gauss, mut magnitude) = (0.0, 0.0, 0.0);
        for ((&x, &wk), &wg) in self
            .nodes
            .iter()
            .zip(&self.kronrod_weights)
            .zip(&self.gauss_weights)
        {
            let fx = f(center + half * x);
            kronrod += wk * fx;
            gauss += wg * fx;
            magnitude += wk * fx.abs();
        }
        Segment {
            a,
            b,
            estimate: kronrod * half,
            error: ((kronrod - gauss) * half).abs(),
            magnitude: magnitude * half.abs(),
        }
    }
}

/// Averages mirrored entries: `v[i] = parity · v[len-1-i]`. With
/// `parity = -1` an odd-length middle entry becomes exactly 0.
fn symmetrize(values: &mut [f64], parity: f64) {
    let len = values.len();
    for i in 0..len / 2 {
        let j = len - 1 - i;
        let m = 0.5 * (parity * values[i] + values[j]);
        values[i] = parity * m;
        values[j] = m;
    }
    if parity < 0.0 && len % 2 == 1 {
        values[len / 2] = 0.0;
    }
}

/// Coefficients of `E_{n+1} = P_{n+1} + Σ c_j P_j` in the Legendre basis,
/// indexed by degree.
///
/// Only degrees of the same parity as `n+1` appear. They are fixed by
/// `∫ P_n E P_k = 0` for odd `k ≤ n`; the even-`k` conditions hold by
/// symmetry.
fn stieltjes_coefficients(n: usize) -> Result<Vec<f64>> {
    // exact for the degree-(3n+1) triple products
    let quad = GaussLegendreRule::new(2 * n + 2)?;
    let tables: Vec<Vec<f64>> = quad
        .nodes()
        .iter()
        .map(|&x| legendre_table(n + 1, x))
        .collect();
    let triple = |a: usize, b: usize, c: usize| -> f64 {
        quad.weights()
            .iter()
            .zip(&tables)
            .map(|(w, p)| w * p[a] * p[b] * p[c])
            .sum()
    };

    let unknowns: Vec<usize> = (0..=n).filter(|j| (n + 1 - j) % 2 == 0).collect();
    let conditions: Vec<usize> = (0..=n).filter(|k| k % 2 == 1).collect();

    let matrix: Vec<Vec<f64>> = conditions
        .iter()
        .map(|&k| unknowns.iter().map(|&j| triple(n, j, k)).collect())
        .collect();
    let rhs: Vec<f64> = conditions.iter().map(|&k| -triple(n, n + 1, k)).collect();
    let solution = solve_dense(matrix, rhs)?;

    let mut coefficients = vec![0.0; n + 2];
    coefficients[n + 1] = 1.0;
    for (&j, c) in unknowns.iter().zip(solution) {
        coefficients[j] = c;
    }
    Ok(coefficients)
}

/// Interpolatory weights: `Σ_i w_i P_k(x_i) = ∫ P_k` for `k < len`.
fn moment_weights(nodes: &[f64]) -> Result<Vec<f64>> {
    let len = nodes.len();
    let tables: Vec<Vec<f64>> = nodes.iter().map(|&x| legendre_table(len - 1, x)).collect();
    let matrix: Vec<Vec<f64>> = (0..len)
        .map(|k| tables.iter().map(|p| p[k]).collect())
        .collect();
    let mut rhs = vec![0.0; len];
    rhs[0] = 2.0;
    solve_dense(matrix, rhs)
}

/// Gaussian elimination with partial pivoting.
fn solve_dense(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        let p = a[pivot][col];
        if p == 0.0 || !p.is_finite() {
            return Err(Error::invalid("rule", "singular system while building Kronrod rule"));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

/// Adaptive Gauss–Kronrod integral of `f` over `[a, b]`.
///
/// Converges when the summed error estimate is at most
/// `target_relative_error · |I|`, or at the rounding floor
/// `50 ε ∫|f|`. Reversed bounds give the negated integral.
///
/// # Errors
/// [`Error::NonConvergence`] when [`MAX_SEGMENTS`] segments are not
/// enough or the integrand produces non-finite values.
///
/// # Examples
/// ```
/// use u_calculus::integrate::gauss_kronrod::{integrate, KronrodPoints};
/// let v = integrate(|x: f64| x.sqrt(), 0.0, 1.0, 1e-10, KronrodPoints::P21).unwrap();
/// assert!((v - 2.0 / 3.0).abs() < 1e-9);
/// ```
pub fn integrate<F>(
    f: F,
    a: f64,
    b: f64,
    target_relative_error: f64,
    points: KronrodPoints,
) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    let rule = KronrodRule::get(points)?;
    let mut segments = vec![rule.apply(&f, a, b)];

    loop {
        let (total, error, magnitude) = segments
            .iter()
            .fold((0.0, 0.0, 0.0), |(t, e, m), s| {
                (t + s.estimate, e + s.error, m + s.magnitude)
            });
        if !(total.is_finite() && error.is_finite()) {
            debug!(a, b, "Gauss-Kronrod integrand produced non-finite values");
            return Err(Error::non_convergence(OPERATION));
        }

        let tolerance = (target_relative_error * total.abs())
            .max(ROUNDOFF_FACTOR * f64::EPSILON * magnitude);
        if error <= tolerance {
            return Ok(total);
        }
        if segments.len() >= MAX_SEGMENTS {
            debug!(
                segments = segments.len(),
                error, tolerance, "Gauss-Kronrod segment budget exhausted"
            );
            return Err(Error::non_convergence(OPERATION));
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
            .map_or(0, |(i, _)| i);
        let segment = segments.swap_remove(worst);
        let mid = 0.5 * (segment.a + segment.b);
        if mid == segment.a || mid == segment.b {
            debug!(a = segment.a, b = segment.b, "Gauss-Kronrod segment cannot be split");
            return Err(Error::non_convergence(OPERATION));
        }
        segments.push(rule.apply(&f, segment.a, mid));
        segments.push(rule.apply(&f, mid, segment.b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    // QUADPACK qk15 tables, positive half, outermost node first
    const XGK15: [f64; 8] = [
        0.991455371120812639,
        0.949107912342758525,
        0.864864423359769073,
        0.741531185599394440,
        0.586087235467691130,
        0.405845151377397167,
        0.207784955007898468,
        0.0,
    ];
    const WGK15: [f64; 8] = [
        0.022935322010529225,
        0.063092092629978553,
        0.104790010322250184,
        0.140653259715525919,
        0.169004726639267903,
        0.190350578064785410,
        0.204432940075298892,
        0.209482141084727828,
    ];
    const WG7: [f64; 4] = [
        0.129484966168869693,
        0.279705391489276668,
        0.381830050505118945,
        0.417959183673469388,
    ];

    #[test]
    fn test_kronrod_points_conversions() {
        assert_eq!(KronrodPoints::try_from(15).unwrap(), KronrodPoints::P15);
        assert_eq!(KronrodPoints::try_from(61).unwrap(), KronrodPoints::P61);
        assert!(matches!(
            KronrodPoints::try_from(17),
            Err(Error::InvalidArgument { arg: "points", .. })
        ));
        assert_eq!(KronrodPoints::P41.gauss_points(), 20);
        assert_eq!(KronrodPoints::default(), KronrodPoints::P15);
    }

    #[test]
    fn test_qk15_matches_published_table() {
        let rule = KronrodRule::get(KronrodPoints::P15).unwrap();
        for i in 0..8 {
            let j = 14 - i;
            assert!(
                (rule.nodes()[j] - XGK15[i]).abs() < 1e-13,
                "node {i}: {} vs {}",
                rule.nodes()[j],
                XGK15[i]
            );
            assert!(
                (rule.kronrod_weights()[j] - WGK15[i]).abs() < 1e-13,
                "weight {i}: {} vs {}",
                rule.kronrod_weights()[j],
                WGK15[i]
            );
        }
        // gauss nodes are xgk[1], xgk[3], xgk[5], xgk[7]
        for (k, &wg) in WG7.iter().enumerate() {
            let j = 14 - (2 * k + 1);
            assert!((rule.gauss_weights()[j] - wg).abs() < 1e-13);
        }
        assert_eq!(rule.gauss_weights()[14], 0.0);
    }

    #[test]
    fn test_every_rule_is_well_formed() {
        for points in KronrodPoints::ALL {
            let rule = KronrodRule::get(points).unwrap();
            let n = points.count();
            assert_eq!(rule.nodes().len(), n);
            assert!(rule.nodes().windows(2).all(|w| w[0] < w[1]), "{points:?}");
            assert!(rule.nodes().iter().all(|x| x.abs() < 1.0));
            assert!(rule.kronrod_weights().iter().all(|&w| w > 0.0), "{points:?}");
            let sk: f64 = rule.kronrod_weights().iter().sum();
            let sg: f64 = rule.gauss_weights().iter().sum();
            assert!((sk - 2.0).abs() < 1e-12, "{points:?}: kronrod sum {sk}");
            assert!((sg - 2.0).abs() < 1e-12, "{points:?}: gauss sum {sg}");
        }
    }

    #[test]
    fn test_every_rule_is_exact_to_degree_3n_plus_1() {
        for points in KronrodPoints::ALL {
            let rule = KronrodRule::get(points).unwrap();
            let d = (3 * points.gauss_points() + 1) as i32;
            let got: f64 = rule
                .nodes()
                .iter()
                .zip(rule.kronrod_weights())
                .map(|(&x, &w)| w * (x + 0.5).powi(d))
                .sum();
            let exact = (1.5_f64.powi(d + 1) - (-0.5_f64).powi(d + 1)) / (d + 1) as f64;
            assert_relative_eq!(got, exact, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_smooth_integrals() {
        let v = integrate(|x: f64| x.sin(), 0.0, PI, 1e-12, KronrodPoints::P15).unwrap();
        assert_relative_eq!(v, 2.0, max_relative = 1e-12);
        let v = integrate(|x: f64| (-x * x).exp(), -3.0, 3.0, 1e-12, KronrodPoints::P61).unwrap();
        assert_relative_eq!(v, 1.772_414_696_519_042, max_relative = 1e-12);
    }

    #[test]
    fn test_endpoint_singularity_is_refined() {
        let v = integrate(|x: f64| x.sqrt(), 0.0, 1.0, 1e-10, KronrodPoints::P15).unwrap();
        assert_relative_eq!(v, 2.0 / 3.0, max_relative = 1e-9);
        let v = integrate(|x: f64| x.ln(), 0.0, 1.0, 1e-10, KronrodPoints::P31).unwrap();
        assert_relative_eq!(v, -1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_reversed_bounds_negate() {
        let f = |x: f64| x.exp();
        let forward = integrate(f, 0.0, 2.0, 1e-10, KronrodPoints::P21).unwrap();
        let backward = integrate(f, 2.0, 0.0, 1e-10, KronrodPoints::P21).unwrap();
        assert_relative_eq!(forward, -backward, max_relative = 1e-14);
    }

    #[test]
    fn test_non_integrable_exhausts_segment_budget() {
        let err = integrate(|x: f64| 1.0 / x, 0.0, 1.0, 1e-10, KronrodPoints::P15).unwrap_err();
        assert_eq!(err, Error::non_convergence(OPERATION));
    }

    #[test]
    fn test_nan_integrand_fails() {
        let f = |x: f64| if x > 0.5 { f64::NAN } else { x };
        assert!(matches!(
            integrate(f, 0.0, 1.0, 1e-10, KronrodPoints::P15),
            Err(Error::NonConvergence { .. })
        ));
    }
}
