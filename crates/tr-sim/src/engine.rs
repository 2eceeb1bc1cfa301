//! Minimal governed engine feeding a gearbox.

use serde::{Deserialize, Serialize};
use tr_gearbox::{EngineInputs, EngineParams, GearBox};

/// Engine speed state driven by the throttle governor.
///
/// With the clutch locked in gear the crankshaft turns with the gearbox
/// shaft. Otherwise it runs towards the governor's demanded RPM at a fixed
/// rate.
#[derive(Clone, Debug, PartialEq)]
pub struct Engine {
    params: EngineParams,
    rpm_rate_per_s: f64,
    real_rpm: f64,
    running: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSaveState {
    pub real_rpm: f64,
    pub running: bool,
}

impl Engine {
    /// Engine idling.
    pub fn new(params: EngineParams, rpm_rate_per_s: f64) -> Self {
        let real_rpm = params.idle_rpm;
        Self {
            params,
            rpm_rate_per_s,
            real_rpm,
            running: true,
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn real_rpm(&self) -> f64 {
        self.real_rpm
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Governor set point: idle at zero throttle, max RPM at full.
    pub fn demanded_rpm(&self, throttle: f64) -> f64 {
        let t = throttle.clamp(0.0, 1.0);
        self.params.idle_rpm + t * (self.params.max_rpm - self.params.idle_rpm)
    }

    pub fn inputs(&self, throttle: f64, speed_mps: f64) -> EngineInputs {
        EngineInputs {
            real_rpm: self.real_rpm,
            demanded_rpm: self.demanded_rpm(throttle),
            throttle: throttle.clamp(0.0, 1.0),
            running: self.running,
            speed_mps,
        }
    }

    /// Advance engine speed after the gearbox has been updated this tick.
    pub fn update(&mut self, dt: f64, throttle: f64, gearbox: &GearBox) {
        if dt <= 0.0 {
            return;
        }
        if gearbox.is_clutch_on() && gearbox.current_gear().is_some() {
            self.real_rpm = gearbox.shaft_rpm().min(self.params.governor_rpm);
            return;
        }
        let target = self.demanded_rpm(throttle);
        let max_delta = self.rpm_rate_per_s * dt;
        self.real_rpm += (target - self.real_rpm).clamp(-max_delta, max_delta);
    }

    pub fn save_state(&self) -> EngineSaveState {
        EngineSaveState {
            real_rpm: self.real_rpm,
            running: self.running,
        }
    }

    pub fn restore(&mut self, state: &EngineSaveState) {
        self.real_rpm = state.real_rpm;
        self.running = state.running;
    }
}
