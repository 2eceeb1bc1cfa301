//! Substep policy for the axle RK4 integrator.

use serde::{Deserialize, Serialize};
use tracing::trace;

pub const MIN_SUBSTEPS: u32 = 1;
pub const MAX_SUBSTEPS: u32 = 50;
/// Calls to wait after an increase before the count may drop again.
const WAIT_AFTER_INCREASE: i32 = 100;
/// Calls below the error bound between successive decreases.
const WAIT_AFTER_DECREASE: i32 = 10;
/// Extra substeps taken when the first slope of a call is too steep.
const STEEP_SLOPE_BOOST: u32 = 5;

/// Hysteresis controller for the number of RK4 substeps per tick.
///
/// The count grows by one whenever the last speed increment exceeds
/// `max((|slip| − 1)·0.01, 0.001)` and shrinks by one only after a quiet
/// period, so a single calm tick does not undo a stiff transient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubstepController {
    substeps: u32,
    wait_before_speeding_up: i32,
}

impl Default for SubstepController {
    fn default() -> Self {
        Self {
            substeps: MIN_SUBSTEPS,
            wait_before_speeding_up: 0,
        }
    }
}

impl SubstepController {
    pub fn substeps(&self) -> u32 {
        self.substeps
    }

    /// Error bound on a single speed increment at the given slip speed (m/s).
    pub fn error_bound(slip_speed_mps: f64) -> f64 {
        ((slip_speed_mps.abs() - 1.0) * 0.01).max(0.001)
    }

    /// Adjust the count from the previous call's integration error.
    pub fn adapt(&mut self, integrator_error: f64, slip_speed_mps: f64) {
        let before = self.substeps;
        if integrator_error.abs() > Self::error_bound(slip_speed_mps) {
            self.substeps += 1;
            self.wait_before_speeding_up = WAIT_AFTER_INCREASE;
        } else {
            self.wait_before_speeding_up -= 1;
            if self.wait_before_speeding_up <= 0 {
                self.substeps = self.substeps.saturating_sub(1);
                self.wait_before_speeding_up = WAIT_AFTER_DECREASE;
            }
        }
        self.substeps = self.substeps.clamp(MIN_SUBSTEPS, MAX_SUBSTEPS);
        if self.substeps != before {
            trace!(from = before, to = self.substeps, integrator_error, "axle substeps changed");
        }
    }

    /// Whether the first slope implies too large an increment for one substep.
    pub fn is_steep(increment_mps: f64, slip_speed_mps: f64) -> bool {
        increment_mps.abs() > ((slip_speed_mps.abs() - 1.0) * 10.0).max(1.0) / 100.0
    }

    pub fn boost(&mut self) {
        let before = self.substeps;
        self.substeps = (self.substeps + STEEP_SLOPE_BOOST).min(MAX_SUBSTEPS);
        if self.substeps != before {
            trace!(from = before, to = self.substeps, "axle substeps boosted");
        }
    }
}
