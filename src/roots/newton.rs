//! Newton–Raphson safeguarded by a bracket.
//!
//! Every Newton step is checked against the current bracket: a step that
//! leaves it, or that does not at least halve the previous step, is
//! replaced by a bisection of the bracket. When the bounds do not straddle
//! a sign change the interval is first scanned in equal pieces for one.

use super::RootOutcome;

/// Robust Newton–Raphson on `[lower, upper]` with derivative `df`.
///
/// Converges when a step shorter than `accuracy` lands on a point with
/// `|f| < accuracy`, or when the bracket itself shrinks below `accuracy`.
/// `subdivisions` is the number of equal sub-intervals scanned for a sign
/// change when `f(lower)` and `f(upper)` share a sign.
pub fn find_root<F, D>(
    f: F,
    df: D,
    lower: f64,
    upper: f64,
    accuracy: f64,
    max_iterations: usize,
    subdivisions: usize,
) -> RootOutcome
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let (lo, hi) = if lower <= upper {
        (lower, upper)
    } else {
        (upper, lower)
    };
    let f_lo = f(lo);
    let f_hi = f(hi);

    if f_lo.abs() < accuracy {
        return RootOutcome::Converged(lo);
    }
    if f_hi.abs() < accuracy {
        return RootOutcome::Converged(hi);
    }
    if f_lo.is_nan() || f_hi.is_nan() {
        return RootOutcome::Failed;
    }

    if f_lo.signum() == f_hi.signum() {
        return scan_for_crossing(&f, &df, lo, hi, f_lo, accuracy, max_iterations, subdivisions);
    }
    bracketed(&f, &df, lo, hi, f_lo, accuracy, max_iterations)
}

/// Newton iteration inside a bracket known to contain a sign change.
fn bracketed<F, D>(
    f: &F,
    df: &D,
    mut lo: f64,
    mut hi: f64,
    mut f_lo: f64,
    accuracy: f64,
    max_iterations: usize,
) -> RootOutcome
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut x = 0.5 * (lo + hi);
    let mut fx = f(x);
    let mut last_step = hi - lo;

    for _ in 0..max_iterations {
        if fx == 0.0 {
            return RootOutcome::Converged(x);
        }
        if fx.is_nan() {
            return RootOutcome::Failed;
        }

        // shrink the bracket around the current iterate
        if fx.signum() == f_lo.signum() {
            lo = x;
            f_lo = fx;
        } else {
            hi = x;
        }
        if hi - lo <= accuracy {
            return RootOutcome::Converged(0.5 * (lo + hi));
        }

        let dfx = df(x);
        let step = fx / dfx;
        let candidate = x - step;
        let newton_ok = step.is_finite()
            && candidate > lo
            && candidate < hi
            && (2.0 * fx).abs() <= (last_step * dfx).abs();

        let previous = x;
        if newton_ok {
            x = candidate;
            last_step = step.abs();
        } else {
            x = 0.5 * (lo + hi);
            last_step = 0.5 * (hi - lo);
        }
        fx = f(x);

        if (x - previous).abs() < accuracy && fx.abs() < accuracy {
            return RootOutcome::Converged(x);
        }
    }
    RootOutcome::Failed
}

/// Splits `[lo, hi]` into `subdivisions` equal pieces and runs the
/// bracketed iteration on each piece that shows a sign change, in order.
#[allow(clippy::too_many_arguments)]
fn scan_for_crossing<F, D>(
    f: &F,
    df: &D,
    lo: f64,
    hi: f64,
    f_lo: f64,
    accuracy: f64,
    max_iterations: usize,
    subdivisions: usize,
) -> RootOutcome
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    if subdivisions < 2 {
        return RootOutcome::Failed;
    }

    let width = (hi - lo) / subdivisions as f64;
    let (mut a, mut fa) = (lo, f_lo);
    for i in 1..=subdivisions {
        let b = if i == subdivisions {
            hi
        } else {
            lo + width * i as f64
        };
        let fb = f(b);
        if fb.abs() < accuracy {
            return RootOutcome::Converged(b);
        }
        if !fa.is_nan() && !fb.is_nan() && fa.signum() != fb.signum() {
            if let RootOutcome::Converged(root) = bracketed(f, df, a, b, fa, accuracy, max_iterations) {
                return RootOutcome::Converged(root);
            }
        }
        a = b;
        fa = fb;
    }
    RootOutcome::Failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_real_root() {
        let f = |x: f64| x * x * x - x - 2.0;
        let df = |x: f64| 3.0 * x * x - 1.0;
        let root = find_root(f, df, 1.0, 2.0, 1e-8, 100, 20)
            .root()
            .expect("bracketed root");
        assert!((root - 1.5213797068045676).abs() < 1e-8, "root = {root}");
    }

    #[test]
    fn test_overshooting_newton_stays_in_bracket() {
        // Newton from the midpoint of [-1, 10] would be thrown far right
        let f = |x: f64| x.atan();
        let df = |x: f64| 1.0 / (1.0 + x * x);
        let root = find_root(f, df, -1.0, 10.0, 1e-10, 100, 20)
            .root()
            .expect("bracketed root");
        assert!(root.abs() < 1e-10, "root = {root}");
    }

    #[test]
    fn test_zero_derivative_falls_back_to_bisection() {
        // f'(0.5) = 0 at the first iterate
        let f = |x: f64| (x - 0.5).powi(3) - 0.001;
        let df = |x: f64| 3.0 * (x - 0.5).powi(2);
        let root = find_root(f, df, 0.0, 1.0, 1e-10, 200, 20)
            .root()
            .expect("bracketed root");
        assert!((root - 0.6).abs() < 1e-8, "root = {root}");
    }

    #[test]
    fn test_same_sign_bounds_scan_for_crossing() {
        // (x-1)(x-2) is positive at both 0 and 3
        let f = |x: f64| (x - 1.0) * (x - 2.0);
        let df = |x: f64| 2.0 * x - 3.0;
        let root = find_root(f, df, 0.0, 3.0, 1e-10, 100, 20)
            .root()
            .expect("scan finds a crossing");
        assert!((root - 1.0).abs() < 1e-9, "root = {root}");
    }

    #[test]
    fn test_same_sign_without_crossing_fails() {
        let f = |x: f64| x * x + 1.0;
        let df = |x: f64| 2.0 * x;
        assert_eq!(
            find_root(f, df, -1.0, 1.0, 1e-8, 100, 20),
            RootOutcome::Failed
        );
    }

    #[test]
    fn test_budget_exhaustion_fails() {
        let f = |x: f64| x * x * x - x - 2.0;
        let df = |x: f64| 3.0 * x * x - 1.0;
        assert_eq!(
            find_root(f, df, 1.0, 2.0, 1e-14, 1, 20),
            RootOutcome::Failed
        );
    }
}
