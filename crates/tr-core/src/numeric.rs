use crate::TrError;

/// Floating point type used throughout the dynamics crates
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TrError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TrError::NonFinite { what, value: v })
    }
}

/// Three-valued sign: -1, 0 or +1.
///
/// Unlike `f64::signum`, exactly zero maps to zero. Direction-following
/// forces (brakes, friction) rely on this to vanish at standstill.
#[inline]
pub fn sign(v: Real) -> Real {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Wrap an angle into [-π, π).
#[inline]
pub fn wrap_angle(rad: Real) -> Real {
    use core::f64::consts::PI;
    (rad + PI).rem_euclid(2.0 * PI) - PI
}

/// Replace NaN/Inf by zero. Used for display-only ratios.
#[inline]
pub fn finite_or_zero(v: Real) -> Real {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        assert!(format!("{err}").contains("Non-finite"));
    }

    #[test]
    fn sign_of_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(-1e-300), -1.0);
    }

    #[test]
    fn wrap_angle_range() {
        for a in [-10.0, -PI, -1.0, 0.0, 1.0, PI, 7.5, 100.0] {
            let w = wrap_angle(a);
            assert!((-PI..PI).contains(&w), "{a} -> {w}");
            let turns = (a - w) / (2.0 * PI);
            assert!((turns - turns.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn finite_or_zero_masks_nan() {
        assert_eq!(finite_or_zero(0.0 / 0.0), 0.0);
        assert_eq!(finite_or_zero(2.5), 2.5);
    }
}
