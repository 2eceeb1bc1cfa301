//! Vehicle-level simulation of one driven wheelset.
//!
//! Provides:
//! - `Powertrain`: axle plus gearbox/engine, motor or force drive, stepped in
//!   a fixed order each tick
//! - Step-wise driver controls from a scenario
//! - Fixed-step scenario runner with decimated recording
//! - Whole-vehicle save state (JSON) for pause and resume

pub mod engine;
pub mod error;
pub mod powertrain;
pub mod schedule;
pub mod sim;
pub mod state;

pub use engine::{Engine, EngineSaveState};
pub use error::{SimError, SimResult};
pub use powertrain::{Powertrain, Traction};
pub use schedule::{ControlSchedule, Controls};
pub use sim::{SimOptions, SimRecord, SimSample, run_scenario};
pub use state::{SAVE_STATE_VERSION, VehicleSaveState};

/// Powertrain, schedule and options for a vehicle file's scenario.
pub fn prepare(vehicle: &tr_project::VehicleDef) -> SimResult<(Powertrain, ControlSchedule, SimOptions)> {
    let powertrain = Powertrain::from_vehicle(vehicle)?;
    let schedule = ControlSchedule::new(vehicle.scenario.controls.clone());
    let opts = SimOptions::from_scenario(&vehicle.scenario);
    Ok((powertrain, schedule, opts))
}
