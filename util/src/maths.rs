//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp `value` into `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap a value into `[0, period)`, guarding the round-off case of [`rem_euclid`].
pub fn wrap<T>(value: T, period: T) -> T
where
    T: Float,
{
    let r = rem_euclid(value, period);
    if r >= period.abs() {
        T::zero()
    } else {
        r
    }
}

/// Signed difference `a - b` on a circle of circumference `period`, in the range
/// `(-period/2, period/2]`.
pub fn wrapped_diff<T>(a: T, b: T, period: T) -> T
where
    T: Float,
{
    let half = period / (T::one() + T::one());
    let d = wrap(a - b, period);
    if d > half {
        d - period
    } else {
        d
    }
}

/// Absolute angular distance between two angles in radians, in the range `[0, pi]`.
pub fn abs_ang_dist<T>(a: T, b: T) -> T
where
    T: Float,
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap_or_else(T::zero);

    let d = rem_euclid((a - b).abs(), tau_t);
    d.min(tau_t - d)
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_abs_ang_dist() {
        assert!((abs_ang_dist(1f64, 2f64) - 1.0).abs() < 1e-12);
        assert!((abs_ang_dist(2f64, 1f64) - 1.0).abs() < 1e-12);
        assert!(abs_ang_dist(0f64, TAU).abs() < 1e-12);
        assert!((abs_ang_dist(0.1f64, TAU - 0.1) - 0.2).abs() < 1e-12);
        assert!((abs_ang_dist(-PI / 2.0, PI / 2.0) - PI).abs() < 1e-12);
        assert!((abs_ang_dist(3.0 * TAU + 0.5, 0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(5.0, 10.0), 5.0);
        assert_eq!(wrap(12.5, 10.0), 2.5);
        assert_eq!(wrap(-2.5, 10.0), 7.5);
        assert_eq!(wrap(10.0, 10.0), 0.0);
    }

    #[test]
    fn test_wrapped_diff() {
        assert_eq!(wrapped_diff(20.0, 10.0, 100.0), 10.0);
        assert_eq!(wrapped_diff(10.0, 20.0, 100.0), -10.0);
        // Across the seam
        assert_eq!(wrapped_diff(5.0, 95.0, 100.0), 10.0);
        assert_eq!(wrapped_diff(95.0, 5.0, 100.0), -10.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
    }
}
