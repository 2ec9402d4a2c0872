//! Special mathematical functions.
//!
//! Gamma, digamma and the harmonic numbers, plus the logit/logistic pair.
//! Every function here is a pure function of its arguments; the only
//! shared data is a read-only factorial table built on first use.
//!
//! # Digamma regimes
//!
//! [`digamma`] walks through its regimes in a fixed order: poles and
//! non-finite inputs, reflection for negative arguments, the two-term
//! expansion next to the pole at zero, and finally upward recurrence to
//! `x ≥ 12` followed by the asymptotic series.

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// Euler–Mascheroni constant γ.
pub const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_860_606_512_090_082_402_43;

/// ζ(2) = π²/6.
const ZETA_2: f64 = 1.644_934_066_848_226_436_472_415_166_646_025_2;

/// ln √(2π)
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_741_780_329_736_405_617_6;

/// Largest `n` with a finite `n!` in `f64`.
const FACTORIAL_MAX: usize = 170;

// ============================================================================
// Gamma Function
// ============================================================================

#[allow(clippy::excessive_precision)]
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.99999999999980993,
    676.5203681218851,
    -1259.1392167224028,
    771.32342877765313,
    -176.61502916214059,
    12.507343278686905,
    -0.13857109526572012,
    9.9843695780195716e-6,
    1.5056327351493116e-7,
];
const LANCZOS_G: f64 = 7.0;

/// Lanczos series `A_g(x)` and the shifted argument `t = x + g + 0.5`,
/// for `x` already reduced by one.
fn lanczos_sum(x: f64) -> (f64, f64) {
    let mut sum = LANCZOS_COEFFICIENTS[0];
    for (i, &c) in LANCZOS_COEFFICIENTS[1..].iter().enumerate() {
        sum += c / (x + i as f64 + 1.0);
    }
    (sum, x + LANCZOS_G + 0.5)
}

/// Lanczos approximation of ln |Γ(x)|.
///
/// Reference: Lanczos (1964), "A Precision Approximation of the Gamma
/// Function", *SIAM Journal on Numerical Analysis* 1(1).
///
/// # Returns
/// - `+∞` at the poles `x = 0, -1, -2, ...`.
/// - `NaN` for `NaN` input.
///
/// # Examples
/// ```
/// use u_calculus::special::ln_gamma;
/// // Γ(5) = 24
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-12);
/// ```
pub fn ln_gamma(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 && x == x.floor() {
        return f64::INFINITY;
    }

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin().abs()).ln() - ln_gamma(1.0 - x);
    }

    let (sum, t) = lanczos_sum(x - 1.0);
    LN_SQRT_2PI + (x - 0.5) * t.ln() - t + sum.ln()
}

/// Gamma function Γ(x), signed, on the whole real line.
///
/// Uses the Lanczos series directly for `x ≥ 0.5` and the reflection
/// formula `Γ(x) Γ(1−x) = π / sin(πx)` below that.
///
/// # Returns
/// - `NaN` at the poles `x = 0, -1, -2, ...` and for `NaN` input.
/// - `+∞` once Γ(x) overflows (`x > 171.62`).
///
/// # Examples
/// ```
/// use u_calculus::special::gamma;
/// // Γ(5) = 4! = 24
/// assert!((gamma(5.0) - 24.0).abs() < 1e-12);
/// // Γ(0.5) = √π
/// assert!((gamma(0.5) - std::f64::consts::PI.sqrt()).abs() < 1e-13);
/// // Γ(-0.5) = -2√π
/// assert!((gamma(-0.5) + 2.0 * std::f64::consts::PI.sqrt()).abs() < 1e-13);
/// ```
pub fn gamma(x: f64) -> f64 {
    if x.is_nan() || (x <= 0.0 && x == x.floor()) {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return f64::INFINITY;
    }

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return pi / ((pi * x).sin() * gamma(1.0 - x));
    }

    if x > 140.0 {
        // t^(x-0.5) overflows before Γ(x) does
        return ln_gamma(x).exp();
    }

    let (sum, t) = lanczos_sum(x - 1.0);
    (2.0 * std::f64::consts::PI).sqrt() * t.powf(x - 0.5) * (-t).exp() * sum
}

// ============================================================================
// Factorials
// ============================================================================

static FACTORIALS: Lazy<[f64; FACTORIAL_MAX + 1]> = Lazy::new(|| {
    let mut table = [1.0; FACTORIAL_MAX + 1];
    for n in 1..=FACTORIAL_MAX {
        table[n] = table[n - 1] * n as f64;
    }
    table
});

/// `n!` as an `f64`, read from a table built once on first use.
///
/// # Returns
/// - `+∞` for `n > 170`.
///
/// # Examples
/// ```
/// use u_calculus::special::factorial;
/// assert_eq!(factorial(0), 1.0);
/// assert_eq!(factorial(5), 120.0);
/// assert!(factorial(171).is_infinite());
/// ```
pub fn factorial(n: u32) -> f64 {
    FACTORIALS
        .get(n as usize)
        .copied()
        .unwrap_or(f64::INFINITY)
}

/// `ln(n!)`, exact table lookup up to 170 and [`ln_gamma`] beyond.
pub fn ln_factorial(n: u32) -> f64 {
    match FACTORIALS.get(n as usize) {
        Some(&f) => f.ln(),
        None => ln_gamma(n as f64 + 1.0),
    }
}

// ============================================================================
// Digamma Function
// ============================================================================

/// Recurrence target: below this the asymptotic series is shifted upward.
const DIGAMMA_ASYMPTOTIC_FROM: f64 = 12.0;
/// Upper edge of the small-argument expansion around the pole at zero.
const DIGAMMA_SMALL_X: f64 = 1e-6;

// Asymptotic series coefficients B_{2k}/(2k)
const S3: f64 = 1.0 / 12.0;
const S4: f64 = 1.0 / 120.0;
const S5: f64 = 1.0 / 252.0;
const S6: f64 = 1.0 / 240.0;
const S7: f64 = 1.0 / 132.0;

/// Digamma function ψ(x) = d/dx ln Γ(x).
///
/// # Algorithm
/// 1. `NaN` or `-∞` → `NaN`.
/// 2. Non-positive integers (poles) → `-∞`.
/// 3. Negative non-integers: reflection `ψ(x) = ψ(1−x) + π / tan(−πx)`.
/// 4. `0 < x ≤ 1e-6`: `−γ − 1/x + ζ(2)·x`.
/// 5. Otherwise shift with `ψ(x) = ψ(x+1) − 1/x` until `x ≥ 12`, then
///    `ln x − 1/(2x) − Σ B_{2k} / (2k x^{2k})` (five terms).
///
/// Reference: Bernardo (1976), "Algorithm AS 103: Psi (Digamma) Function",
/// *Applied Statistics* 25(3).
///
/// # Examples
/// ```
/// use u_calculus::special::{digamma, EULER_MASCHERONI};
/// assert!((digamma(1.0) + EULER_MASCHERONI).abs() < 1e-13);
/// assert_eq!(digamma(-2.0), f64::NEG_INFINITY);
/// ```
pub fn digamma(x: f64) -> f64 {
    if x.is_nan() || x == f64::NEG_INFINITY {
        return f64::NAN;
    }

    if x <= 0.0 && x == x.floor() {
        return f64::NEG_INFINITY;
    }

    if x < 0.0 {
        let pi = std::f64::consts::PI;
        return digamma(1.0 - x) + pi / (-pi * x).tan();
    }

    if x <= DIGAMMA_SMALL_X {
        return -EULER_MASCHERONI - 1.0 / x + ZETA_2 * x;
    }

    let mut x = x;
    let mut result = 0.0;
    while x < DIGAMMA_ASYMPTOTIC_FROM {
        result -= 1.0 / x;
        x += 1.0;
    }

    let mut r = 1.0 / x;
    result += x.ln() - 0.5 * r;
    r *= r;
    result -= r * (S3 - r * (S4 - r * (S5 - r * (S6 - r * S7))));
    result
}

/// Step below which [`digamma_inv`] stops refining.
const DIGAMMA_INV_MIN_STEP: f64 = 1e-15;

/// Inverse of the digamma function on the positive half-line.
///
/// Returns the unique `x > 0` with `ψ(x) = p`.
///
/// # Algorithm
/// Starts at `x = exp(p)` and takes signed steps `x += d · sign(p − ψ(x))`
/// with `d = 1, 1/2, 1/4, ...` until `d < 1e-15` (50 evaluations).
/// Monotonicity of ψ on `(0, ∞)` keeps the walk pointed at the root.
///
/// # Returns
/// - `NaN` for `NaN` input, `0` for `-∞`, `+∞` for `+∞`.
///
/// # Examples
/// ```
/// use u_calculus::special::{digamma, digamma_inv};
/// let x = digamma_inv(digamma(2.5));
/// assert!((x - 2.5).abs() < 1e-12);
/// ```
pub fn digamma_inv(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p == f64::NEG_INFINITY {
        return 0.0;
    }
    if p == f64::INFINITY {
        return f64::INFINITY;
    }

    let mut x = p.exp();
    let mut d = 1.0;
    while d > DIGAMMA_INV_MIN_STEP {
        x += d * sign(p - digamma(x));
        d /= 2.0;
    }
    x
}

/// Three-valued sign: `f64::signum` maps `0.0` to `1.0`, which would keep
/// the walk moving after an exact hit.
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// ============================================================================
// Harmonic Numbers
// ============================================================================

/// Harmonic number `H(t) = γ + ψ(t + 1)`, defined for real `t`.
///
/// # Examples
/// ```
/// use u_calculus::special::harmonic;
/// // H(4) = 1 + 1/2 + 1/3 + 1/4 = 25/12
/// assert!((harmonic(4.0) - 25.0 / 12.0).abs() < 1e-13);
/// ```
pub fn harmonic(t: f64) -> f64 {
    EULER_MASCHERONI + digamma(t + 1.0)
}

/// Generalized harmonic number `H(n, m) = Σ_{i=1}^{n} i^(−m)`.
///
/// Direct left-to-right summation.
///
/// # Examples
/// ```
/// use u_calculus::special::general_harmonic;
/// assert_eq!(general_harmonic(4, 1.0), 1.0 + 1.0 / 2.0 + 1.0 / 3.0 + 1.0 / 4.0);
/// assert_eq!(general_harmonic(0, 2.0), 0.0);
/// ```
pub fn general_harmonic(n: usize, m: f64) -> f64 {
    let mut sum = 0.0;
    for i in 1..=n {
        sum += 1.0 / (i as f64).powf(m);
    }
    sum
}

// ============================================================================
// Logit / Logistic
// ============================================================================

/// Logit `ln(p / (1 − p))`, the inverse of [`logistic`].
///
/// # Errors
/// [`Error::OutOfRange`] when `p` is outside `[0, 1]` (including `NaN`).
/// The endpoints map to `−∞` and `+∞`.
///
/// # Examples
/// ```
/// use u_calculus::special::logit;
/// assert_eq!(logit(0.5).unwrap(), 0.0);
/// assert!(logit(1.5).is_err());
/// ```
pub fn logit(p: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::OutOfRange {
            arg: "p",
            value: p,
            reason: "must lie in [0, 1]",
        });
    }
    Ok((p / (1.0 - p)).ln())
}

/// Logistic sigmoid `1 / (1 + e^(−p))`, defined on the whole real line.
///
/// # Examples
/// ```
/// use u_calculus::special::logistic;
/// assert_eq!(logistic(0.0), 0.5);
/// assert_eq!(logistic(f64::NEG_INFINITY), 0.0);
/// ```
pub fn logistic(p: f64) -> f64 {
    1.0 / (1.0 + (-p).exp())
}
