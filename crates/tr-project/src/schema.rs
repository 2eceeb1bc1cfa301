//! Vehicle file schema definitions.

use serde::{Deserialize, Serialize};
use tr_axle::AxleParams;
use tr_gearbox::{EngineParams, GearBoxParams};
use tr_motor::{InductionMotorParams, SeriesMotorParams};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleDef {
    pub version: u32,
    pub name: String,
    pub axle: AxleParams,
    pub drive: DriveDef,
    #[serde(default)]
    pub scenario: ScenarioDef,
}

/// How throttle reaches the wheelset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DriveDef {
    /// Trailing axle: brakes only.
    NotDriven,
    /// Throttle scales a commanded rail force.
    Force { max_force_n: f64 },
    /// Throttle scales the terminal voltage of a series motor.
    SeriesMotor {
        motor: SeriesMotorParams,
        max_voltage_v: f64,
    },
    /// Throttle scales the inverter's target force.
    InductionMotor {
        motor: InductionMotorParams,
        max_force_n: f64,
    },
    /// Combustion engine through a gearbox.
    GearBox {
        gearbox: GearBoxParams,
        engine: EngineParams,
        #[serde(default)]
        initial_gear: Option<i32>,
        /// Engine acceleration when not held by a locked clutch (rpm/s)
        #[serde(default = "default_engine_rpm_rate")]
        engine_rpm_rate_per_s: f64,
    },
}

fn default_engine_rpm_rate() -> f64 {
    400.0
}

impl DriveDef {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DriveDef::NotDriven => "NotDriven",
            DriveDef::Force { .. } => "Force",
            DriveDef::SeriesMotor { .. } => "SeriesMotor",
            DriveDef::InductionMotor { .. } => "InductionMotor",
            DriveDef::GearBox { .. } => "GearBox",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    #[serde(default = "default_dt_s")]
    pub dt_s: f64,
    #[serde(default = "default_t_end_s")]
    pub t_end_s: f64,
    #[serde(default = "default_record_every")]
    pub record_every: usize,
    #[serde(default)]
    pub initial_speed_mps: f64,
    /// Mass the axle force accelerates; without it train speed is held constant.
    #[serde(default)]
    pub train_mass_kg: Option<f64>,
    /// Control changes in time order; each holds until the next.
    #[serde(default)]
    pub controls: Vec<ControlPointDef>,
}

fn default_dt_s() -> f64 {
    0.01
}

fn default_t_end_s() -> f64 {
    10.0
}

fn default_record_every() -> usize {
    10
}

impl Default for ScenarioDef {
    fn default() -> Self {
        Self {
            dt_s: default_dt_s(),
            t_end_s: default_t_end_s(),
            record_every: default_record_every(),
            initial_speed_mps: 0.0,
            train_mass_kg: None,
            controls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlPointDef {
    pub time_s: f64,
    #[serde(default)]
    pub throttle: f64,
    #[serde(default)]
    pub brake_force_n: f64,
    /// Operator gear request applied once at `time_s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear: Option<GearCommandDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GearCommandDef {
    Up,
    Down,
}
