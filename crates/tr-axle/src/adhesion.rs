//! Wheel/rail adhesion as a function of slip speed.

use tr_core::{kph_to_mps, mps_to_kph, sign};

const SQRT_3: f64 = 1.732_050_807_568_877_2;
/// Fraction of peak adhesion retained at very large slip.
const FULL_SLIP_FRACTION: f64 = 0.4;

/// Adhesive force fraction at the given slip speed.
///
/// With `x = slip_kph · umax / K`:
///
/// ```text
/// |x| ≤ √3:  f = 2·umax·x / (1 + x²)
/// |x| > √3:  f = sign(x)·umax·((√3/2 − 0.4)·exp((√3 − |x|)/(2√3 − 1.6)) + 0.4)
/// ```
///
/// The two branches meet with equal value and slope at |x| = √3. The peak
/// `umax` sits at |x| = 1. `_speed_mps` is currently unused.
pub fn slip_characteristics(slip_speed_mps: f64, _speed_mps: f64, k: f64, umax: f64) -> f64 {
    if !(k > 0.0) || !(umax > 0.0) {
        return 0.0;
    }
    let x = mps_to_kph(slip_speed_mps) * umax / k;
    let ax = x.abs();
    if ax <= SQRT_3 {
        return 2.0 * umax * x / (1.0 + x * x);
    }
    let a = 0.5 * SQRT_3 - FULL_SLIP_FRACTION;
    let b = 2.0 * SQRT_3 - 4.0 * FULL_SLIP_FRACTION;
    sign(x) * umax * (a * ((SQRT_3 - ax) / b).exp() + FULL_SLIP_FRACTION)
}

/// Slip speed (m/s) on the rising branch that yields `ratio · umax`.
///
/// `ratio` is clamped to [−1, 1].
pub fn slip_characteristics_inverse(ratio: f64, k: f64, umax: f64) -> f64 {
    if !(k > 0.0) || !(umax > 0.0) {
        return 0.0;
    }
    let r = ratio.clamp(-1.0, 1.0);
    if r == 0.0 {
        return 0.0;
    }
    let x = (1.0 - (1.0 - r * r).sqrt()) / r;
    kph_to_mps(x * k / umax)
}

/// Slip speed at peak adhesion (m/s).
pub fn peak_slip_speed_mps(k: f64, umax: f64) -> f64 {
    kph_to_mps(k / umax)
}
