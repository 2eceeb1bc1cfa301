//! Engine data the gearbox consumes. The engine model itself lives elsewhere.

use crate::error::{GearBoxError, GearBoxResult};
use serde::{Deserialize, Serialize};
use tr_core::Curve;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    pub idle_rpm: f64,
    pub max_rpm: f64,
    /// RPM below which a locked friction clutch stalls the engine
    pub starting_rpm: f64,
    pub governor_rpm: f64,
    pub max_power_w: f64,
    /// Full-throttle torque (N·m) against RPM
    pub torque_curve: Curve,
    /// Drag torque (N·m) against RPM with fuel cut
    #[serde(default)]
    pub stall_torque_curve: Option<Curve>,
}

impl EngineParams {
    pub fn validate(&self) -> GearBoxResult<()> {
        if !(self.idle_rpm > 0.0 && self.max_rpm > self.idle_rpm) {
            return Err(GearBoxError::InvalidConfig {
                what: "engine RPM range must satisfy 0 < idle < max",
            });
        }
        if !(self.starting_rpm >= 0.0 && self.starting_rpm < self.max_rpm) {
            return Err(GearBoxError::InvalidConfig {
                what: "starting RPM must lie below max RPM",
            });
        }
        if !(self.governor_rpm > 0.0) {
            return Err(GearBoxError::InvalidConfig {
                what: "governor RPM must be positive",
            });
        }
        if !(self.max_power_w > 0.0) {
            return Err(GearBoxError::InvalidConfig {
                what: "engine max power must be positive",
            });
        }
        Ok(())
    }
}

/// Engine quantities sampled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineInputs {
    pub real_rpm: f64,
    /// RPM the governor is aiming for at the current throttle
    pub demanded_rpm: f64,
    /// Throttle fraction in [0, 1]
    pub throttle: f64,
    pub running: bool,
    /// Signed vehicle speed (m/s)
    pub speed_mps: f64,
}

impl EngineInputs {
    pub fn throttle(&self) -> f64 {
        self.throttle.clamp(0.0, 1.0)
    }
}
