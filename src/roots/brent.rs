//! Brent–Dekker root finding: bisection safeguarding secant and inverse
//! quadratic interpolation steps.
//!
//! Reference: Brent (1973), *Algorithms for Minimization without
//! Derivatives*, ch. 4; Press et al. (2007), *Numerical Recipes*, 3rd ed.,
//! §9.3.

use super::RootOutcome;

/// Brent's method on `[lower, upper]`.
///
/// The returned root lies within `accuracy` (plus a few ulps) of a sign
/// change of `f`. Fails without a sign change at the bounds, on `NaN`
/// function values, or after `max_iterations` steps.
pub fn find_root<F>(f: F, lower: f64, upper: f64, accuracy: f64, max_iterations: usize) -> RootOutcome
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (lower, upper);
    let (mut fa, mut fb) = (f(a), f(b));

    if fa == 0.0 {
        return RootOutcome::Converged(a);
    }
    if fb == 0.0 {
        return RootOutcome::Converged(b);
    }
    if fa.is_nan() || fb.is_nan() || fa.signum() == fb.signum() {
        return RootOutcome::Failed;
    }

    // c is the contrapoint: [b, c] always brackets the root
    let (mut c, mut fc) = (b, fb);
    let mut d = b - a;
    let mut e = d;

    for _ in 0..max_iterations {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * accuracy;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return RootOutcome::Converged(b);
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // secant
                (2.0 * xm * s, 1.0 - s)
            } else {
                // inverse quadratic interpolation
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * xm * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(xm) };
        fb = f(b);
        if fb.is_nan() {
            return RootOutcome::Failed;
        }
    }
    RootOutcome::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_sqrt_two() {
        let root = find_root(|x| x * x - 2.0, 0.0, 2.0, 1e-8, 100)
            .root()
            .expect("bracketed root");
        assert!((root - std::f64::consts::SQRT_2).abs() < 1e-8);
    }

    #[test]
    fn test_transcendental() {
        // cos(x) = x
        let root = find_root(|x: f64| x.cos() - x, 0.0, 1.0, 1e-12, 100)
            .root()
            .expect("bracketed root");
        assert!((root - 0.7390851332151607).abs() < 1e-11);
    }

    #[test]
    fn test_converges_faster_than_bisection() {
        let calls = Cell::new(0usize);
        let f = |x: f64| {
            calls.set(calls.get() + 1);
            x.exp() - 5.0
        };
        let root = find_root(f, 0.0, 4.0, 1e-12, 100).root().expect("root");
        assert!((root - 5.0_f64.ln()).abs() < 1e-11);
        // bisection would need ~42 evaluations for this width
        assert!(calls.get() < 20, "used {} evaluations", calls.get());
    }

    #[test]
    fn test_no_sign_change_fails() {
        assert_eq!(
            find_root(|x| x * x + 1.0, -2.0, 3.0, 1e-8, 100),
            RootOutcome::Failed
        );
    }

    #[test]
    fn test_budget_exhaustion_fails() {
        assert_eq!(
            find_root(|x: f64| x.powi(9) - 0.5, 0.0, 1e3, 1e-14, 3),
            RootOutcome::Failed
        );
    }
}
