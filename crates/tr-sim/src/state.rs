//! Whole-vehicle save state for pausing and resuming a run.

use crate::engine::EngineSaveState;
use crate::error::{SimError, SimResult};
use crate::powertrain::{Powertrain, Traction};
use crate::schedule::ControlSchedule;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tr_axle::AxleSaveState;
use tr_gearbox::GearBoxSaveState;

pub const SAVE_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSaveState {
    pub version: u32,
    pub time_s: f64,
    /// Control points already applied
    pub schedule_position: usize,
    pub axle: AxleSaveState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gearbox: Option<GearBoxSaveState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineSaveState>,
}

impl VehicleSaveState {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> SimResult<Self> {
        let state: Self = serde_json::from_str(text)?;
        if state.version > SAVE_STATE_VERSION {
            return Err(SimError::SaveStateMismatch {
                what: "save state written by a newer version",
            });
        }
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> SimResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

impl Powertrain {
    pub fn save_state(&self, schedule: &ControlSchedule) -> VehicleSaveState {
        VehicleSaveState {
            version: SAVE_STATE_VERSION,
            time_s: self.time_s(),
            schedule_position: schedule.position(),
            axle: self.axle().save_state(),
            gearbox: self.gearbox().map(|g| g.save_state()),
            engine: self.engine().map(|e| e.save_state()),
        }
    }

    /// Restore a snapshot taken from a powertrain built from the same vehicle.
    pub fn restore(&mut self, state: &VehicleSaveState, schedule: &mut ControlSchedule) -> SimResult<()> {
        match (self.traction_mut(), &state.gearbox, &state.engine) {
            (Traction::GearBox { gearbox, engine }, Some(gs), Some(es)) => {
                gearbox.restore(Some(gs))?;
                engine.restore(es);
            }
            (Traction::GearBox { .. }, _, _) => {
                return Err(SimError::SaveStateMismatch {
                    what: "gearbox vehicle needs gearbox and engine state",
                });
            }
            (_, None, None) => {}
            _ => {
                return Err(SimError::SaveStateMismatch {
                    what: "save state carries gearbox state but the vehicle has no gearbox",
                });
            }
        }
        self.axle_mut().restore(Some(&state.axle))?;
        self.set_time_s(state.time_s);
        schedule.seek(state.schedule_position);
        Ok(())
    }
}
