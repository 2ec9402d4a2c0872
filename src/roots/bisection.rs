//! Plain interval bisection.

use super::RootOutcome;

/// Bisection on `[lower, upper]`.
///
/// Converges when the half-width of the bracket drops to `accuracy`, when
/// the midpoint hits an exact zero, or when the bracket can no longer be
/// split in `f64`. Fails when the bounds do not bracket a sign change,
/// when `f` returns `NaN`, or when `max_iterations` halvings are not
/// enough.
pub fn find_root<F>(f: F, lower: f64, upper: f64, accuracy: f64, max_iterations: usize) -> RootOutcome
where
    F: Fn(f64) -> f64,
{
    let (mut lo, mut hi) = if lower <= upper {
        (lower, upper)
    } else {
        (upper, lower)
    };
    let mut f_lo = f(lo);
    let f_hi = f(hi);

    if f_lo == 0.0 {
        return RootOutcome::Converged(lo);
    }
    if f_hi == 0.0 {
        return RootOutcome::Converged(hi);
    }
    if f_lo.is_nan() || f_hi.is_nan() || f_lo.signum() == f_hi.signum() {
        return RootOutcome::Failed;
    }

    for _ in 0..max_iterations {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 || 0.5 * (hi - lo) <= accuracy || mid <= lo || mid >= hi {
            return RootOutcome::Converged(mid);
        }
        if f_mid.is_nan() {
            return RootOutcome::Failed;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    RootOutcome::Failed
}
