//! Debounced threshold flags.

use serde::{Deserialize, Serialize};

/// Time a condition must persist before the flag is raised (s).
pub const SLIP_DWELL_S: f64 = 0.1;

/// Raises a flag once a condition has held continuously for the dwell time.
///
/// The flag drops, and the timer restarts, on the first tick the condition
/// is false.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DwellDetector {
    elapsed_s: f64,
    active: bool,
}

impl DwellDetector {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// Feed one tick. Returns true on the tick the flag is raised.
    pub fn update(&mut self, condition: bool, dt: f64) -> bool {
        if !condition {
            self.elapsed_s = 0.0;
            self.active = false;
            return false;
        }
        if self.elapsed_s >= SLIP_DWELL_S {
            let raised = !self.active;
            self.active = true;
            raised
        } else {
            self.elapsed_s += dt;
            false
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brief_crossing_does_not_raise() {
        let mut d = DwellDetector::default();
        for _ in 0..5 {
            d.update(true, 0.01);
        }
        d.update(false, 0.01);
        for _ in 0..5 {
            d.update(true, 0.01);
        }
        assert!(!d.is_active());
    }

    #[test]
    fn sustained_condition_raises_once() {
        let mut d = DwellDetector::default();
        let mut raised = 0;
        for _ in 0..50 {
            if d.update(true, 0.01) {
                raised += 1;
            }
        }
        assert!(d.is_active());
        assert_eq!(raised, 1);
        d.update(false, 0.01);
        assert!(!d.is_active());
        assert_eq!(d.elapsed_s(), 0.0);
    }
}
