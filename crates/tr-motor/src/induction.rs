//! Asynchronous (induction) traction motor with inverter slip control.

use crate::common::MotorCommon;
use crate::error::{MotorError, MotorResult};
use crate::thermal::{ThermalModel, ThermalParams, ThermalSaveState};
use crate::traits::{AxleKinematics, ElectricMotor};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Fraction of the wheel-slip threshold the inverter aims for in slip control.
const SLIP_CONTROL_MARGIN: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductionMotorParams {
    /// Top speed the inverter will synthesise a field for (m/s at the rail)
    pub engine_max_speed_mps: f64,
    /// Rotor slip speed at which full torque is reached (rad/s)
    #[serde(default = "default_optimal_async_speed_rad_s")]
    pub optimal_async_speed_rad_s: f64,
    #[serde(default)]
    pub slip_control: bool,
    #[serde(default = "default_pole_pairs")]
    pub pole_pairs: u32,
    #[serde(default = "default_inertia_kgm2")]
    pub inertia_kgm2: f64,
    #[serde(default)]
    pub friction_torque_nm: f64,
    #[serde(default)]
    pub thermal: ThermalParams,
}

fn default_optimal_async_speed_rad_s() -> f64 {
    1.0
}

fn default_pole_pairs() -> u32 {
    2
}

fn default_inertia_kgm2() -> f64 {
    1.0
}

impl InductionMotorParams {
    pub fn validate(&self) -> MotorResult<()> {
        if !(self.engine_max_speed_mps > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "engine max speed must be positive",
            });
        }
        if !(self.optimal_async_speed_rad_s > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "optimal asynchronous speed must be positive",
            });
        }
        if self.pole_pairs == 0 {
            return Err(MotorError::InvalidArg {
                what: "pole pairs must be at least one",
            });
        }
        self.thermal.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InductionMotorSaveState {
    pub target_force_n: f64,
    pub drive_speed_rad_s: f64,
    pub required_torque_nm: f64,
    pub developed_torque_nm: f64,
    pub motor_speed_rad_s: f64,
    pub power_losses_w: f64,
    pub thermal: ThermalSaveState,
}

/// Induction motor fed by a slip-controlling inverter.
///
/// Each tick the inverter picks a synchronous drive speed, then torque is
/// proportional to rotor slip against it:
///
/// ```text
/// T(ω) = T_req · clamp((ω_drive − ω) / ω_opt, −1, 1)
/// T_req = |F_target| · r / ratio
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InductionMotor {
    pub common: MotorCommon,
    params: InductionMotorParams,
    /// Rail force the controller asks for (N); sign selects motoring or braking
    pub target_force_n: f64,
    drive_speed_rad_s: f64,
    required_torque_nm: f64,
}

impl InductionMotor {
    pub fn new(params: InductionMotorParams) -> MotorResult<Self> {
        params.validate()?;
        let thermal = ThermalModel::new(params.thermal.clone())?;
        let common = MotorCommon::new(params.inertia_kgm2, params.friction_torque_nm, thermal)?;
        Ok(Self {
            common,
            params,
            target_force_n: 0.0,
            drive_speed_rad_s: 0.0,
            required_torque_nm: 0.0,
        })
    }

    pub fn params(&self) -> &InductionMotorParams {
        &self.params
    }

    pub fn set_slip_control(&mut self, enabled: bool) {
        self.params.slip_control = enabled;
    }

    pub fn drive_speed_rad_s(&self) -> f64 {
        self.drive_speed_rad_s
    }

    /// Inverter output frequency (Hz).
    pub fn drive_frequency_hz(&self) -> f64 {
        self.drive_speed_rad_s * self.params.pole_pairs as f64 / (2.0 * core::f64::consts::PI)
    }

    pub fn required_torque_nm(&self) -> f64 {
        self.required_torque_nm
    }

    fn select_drive_speed(&mut self, axle: &AxleKinematics) {
        let lin_to_ang = self.common.transmission_ratio() / self.common.wheel_radius_m();
        let opt = self.params.optimal_async_speed_rad_s;
        let reference_mps = if self.params.slip_control {
            let margin = axle.wheel_slip_threshold_mps * SLIP_CONTROL_MARGIN;
            if self.target_force_n > 0.0 {
                Some(axle.train_speed_mps + margin)
            } else if self.target_force_n < 0.0 {
                Some(axle.train_speed_mps - margin)
            } else {
                None
            }
        } else if self.target_force_n > 0.0 {
            Some(self.params.engine_max_speed_mps)
        } else if self.target_force_n < 0.0 {
            Some(-self.params.engine_max_speed_mps)
        } else {
            None
        };
        if let Some(v) = reference_mps {
            let offset = if self.target_force_n > 0.0 { opt } else { -opt };
            self.drive_speed_rad_s = v * lin_to_ang + offset;
        }
    }

    pub fn save_state(&self) -> InductionMotorSaveState {
        InductionMotorSaveState {
            target_force_n: self.target_force_n,
            drive_speed_rad_s: self.drive_speed_rad_s,
            required_torque_nm: self.required_torque_nm,
            developed_torque_nm: self.common.developed_torque_nm,
            motor_speed_rad_s: self.common.motor_speed_rad_s,
            power_losses_w: self.common.power_losses_w,
            thermal: self.common.thermal.save_state(),
        }
    }

    pub fn restore(&mut self, state: &InductionMotorSaveState) {
        self.target_force_n = state.target_force_n;
        self.drive_speed_rad_s = state.drive_speed_rad_s;
        self.required_torque_nm = state.required_torque_nm;
        self.common.developed_torque_nm = state.developed_torque_nm;
        self.common.motor_speed_rad_s = state.motor_speed_rad_s;
        self.common.power_losses_w = state.power_losses_w;
        self.common.thermal.restore(&state.thermal);
    }
}

impl ElectricMotor for InductionMotor {
    fn common(&self) -> &MotorCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut MotorCommon {
        &mut self.common
    }

    fn developed_torque_nm(&self, motor_speed_rad_s: f64) -> f64 {
        let slip = (self.drive_speed_rad_s - motor_speed_rad_s) / self.params.optimal_async_speed_rad_s;
        let torque = self.required_torque_nm * slip.clamp(-1.0, 1.0);
        self.common.apply_friction(torque, motor_speed_rad_s)
    }

    fn update(&mut self, dt: f64, axle: &AxleKinematics) {
        if dt <= 0.0 {
            return;
        }
        self.select_drive_speed(axle);
        self.required_torque_nm =
            self.target_force_n.abs() * self.common.wheel_radius_m() / self.common.transmission_ratio();

        let omega = self.common.motor_speed_from_axle(axle.axle_speed_mps);
        self.common.motor_speed_rad_s = omega;
        self.common.developed_torque_nm = self.developed_torque_nm(omega);
        self.common.power_losses_w =
            (self.common.developed_torque_nm * (self.drive_speed_rad_s - omega)).abs();
        self.common.update_thermal(dt);

        trace!(
            axle = %axle.axle,
            drive_speed_rad_s = self.drive_speed_rad_s,
            required_torque_nm = self.required_torque_nm,
            torque_nm = self.common.developed_torque_nm,
            "induction motor update"
        );
    }

    fn reset(&mut self) {
        self.common.motor_speed_rad_s = 0.0;
    }
}
