//! DC series-wound traction motor.

use crate::common::MotorCommon;
use crate::error::{MotorError, MotorResult};
use crate::thermal::{ThermalModel, ThermalParams, ThermalSaveState};
use crate::traits::{AxleKinematics, ElectricMotor};
use serde::{Deserialize, Serialize};
use tr_core::constants::{COPPER_INFERRED_ZERO_K, REFERENCE_TEMPERATURE_C, ZERO_CELSIUS_K};
use tracing::{debug, trace};

const MAX_ELECTRICAL_SUBSTEPS: usize = 100;

/// Electrical and mechanical constants of a series motor.
///
/// Resistances are given at 20 °C and corrected for winding temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMotorParams {
    pub nominal_current_a: f64,
    pub nominal_voltage_v: f64,
    pub nominal_speed_rad_s: f64,
    pub armature_resistance_ohm: f64,
    #[serde(default)]
    pub armature_inductance_h: f64,
    pub field_resistance_ohm: f64,
    pub field_inductance_h: f64,
    /// Field diverter resistor; zero selects the open-shunt topology
    #[serde(default)]
    pub shunt_resistor_ohm: f64,
    #[serde(default)]
    pub starting_resistor_ohm: f64,
    /// Interpole compensation fitted
    #[serde(default)]
    pub compensated: bool,
    #[serde(default = "default_inertia_kgm2")]
    pub inertia_kgm2: f64,
    #[serde(default)]
    pub friction_torque_nm: f64,
    #[serde(default)]
    pub thermal: ThermalParams,
}

fn default_inertia_kgm2() -> f64 {
    1.0
}

impl SeriesMotorParams {
    pub fn validate(&self) -> MotorResult<()> {
        if !(self.nominal_current_a > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "nominal current must be positive",
            });
        }
        if !(self.nominal_voltage_v > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "nominal voltage must be positive",
            });
        }
        if !(self.nominal_speed_rad_s > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "nominal speed must be positive",
            });
        }
        if !(self.field_inductance_h > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "field inductance must be positive",
            });
        }
        for (value, what) in [
            (self.armature_resistance_ohm, "armature resistance cannot be negative"),
            (self.armature_inductance_h, "armature inductance cannot be negative"),
            (self.field_resistance_ohm, "field resistance cannot be negative"),
            (self.shunt_resistor_ohm, "shunt resistor cannot be negative"),
            (self.starting_resistor_ohm, "starting resistor cannot be negative"),
        ] {
            if !(value >= 0.0) {
                return Err(MotorError::InvalidArg { what });
            }
        }
        let drop = self.nominal_current_a * (self.armature_resistance_ohm + self.field_resistance_ohm);
        if drop >= self.nominal_voltage_v {
            return Err(MotorError::InvalidArg {
                what: "nominal voltage must exceed the resistive drop at nominal current",
            });
        }
        self.thermal.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesMotorSaveState {
    pub field_current_a: f64,
    pub armature_current_a: f64,
    pub field_wb: f64,
    pub developed_torque_nm: f64,
    pub motor_speed_rad_s: f64,
    pub power_losses_w: f64,
    pub terminal_voltage_v: f64,
    pub additional_resistance_ohm: f64,
    pub shunt_ratio: f64,
    pub thermal: ThermalSaveState,
}

/// Series motor with field-current dynamics.
///
/// Voltage balance on the field winding:
///
/// ```text
/// L_f · dI_f/dt = V − E − I_a·R_a − I_f·R_f·(1 − s) − I_a·(R_start + R_add)
/// E = Φ · ω,   T = Φ · I_a
/// ```
///
/// where `s` is the shunt ratio. The field current never reverses: it is held
/// at zero whenever it or the back-EMF/current product would turn negative.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMotor {
    pub common: MotorCommon,
    params: SeriesMotorParams,
    field_current_a: f64,
    armature_current_a: f64,
    field_wb: f64,
    terminal_voltage_v: f64,
    additional_resistance_ohm: f64,
    shunt_ratio: f64,
}

impl SeriesMotor {
    pub fn new(params: SeriesMotorParams) -> MotorResult<Self> {
        params.validate()?;
        let thermal = ThermalModel::new(params.thermal.clone())?;
        let common = MotorCommon::new(params.inertia_kgm2, params.friction_torque_nm, thermal)?;
        Ok(Self {
            common,
            params,
            field_current_a: 0.0,
            armature_current_a: 0.0,
            field_wb: 0.0,
            terminal_voltage_v: 0.0,
            additional_resistance_ohm: 0.0,
            shunt_ratio: 0.0,
        })
    }

    pub fn params(&self) -> &SeriesMotorParams {
        &self.params
    }

    pub fn terminal_voltage_v(&self) -> f64 {
        self.terminal_voltage_v
    }

    pub fn set_terminal_voltage_v(&mut self, value: f64) {
        self.terminal_voltage_v = value;
    }

    pub fn additional_resistance_ohm(&self) -> f64 {
        self.additional_resistance_ohm
    }

    pub fn set_additional_resistance_ohm(&mut self, value: f64) -> MotorResult<()> {
        if !(value >= 0.0) {
            return Err(MotorError::InvalidArg {
                what: "additional resistance cannot be negative",
            });
        }
        self.additional_resistance_ohm = value;
        Ok(())
    }

    pub fn shunt_percent(&self) -> f64 {
        self.shunt_ratio * 100.0
    }

    /// Field weakening in percent, [0, 100).
    pub fn set_shunt_percent(&mut self, value: f64) -> MotorResult<()> {
        if !(0.0..100.0).contains(&value) {
            return Err(MotorError::InvalidArg {
                what: "shunt percent must be in [0, 100)",
            });
        }
        self.shunt_ratio = value / 100.0;
        Ok(())
    }

    pub fn field_current_a(&self) -> f64 {
        self.field_current_a
    }

    pub fn armature_current_a(&self) -> f64 {
        self.armature_current_a
    }

    pub fn field_wb(&self) -> f64 {
        self.field_wb
    }

    pub fn back_emf_v(&self) -> f64 {
        self.field_wb * self.common.motor_speed_rad_s
    }

    fn temperature_factor(&self) -> f64 {
        let t_c = self.common.thermal.temperature_k() - ZERO_CELSIUS_K;
        (COPPER_INFERRED_ZERO_K + t_c) / (COPPER_INFERRED_ZERO_K + REFERENCE_TEMPERATURE_C)
    }

    /// Armature resistance at the current winding temperature.
    pub fn armature_resistance_ohm(&self) -> f64 {
        self.params.armature_resistance_ohm * self.temperature_factor()
    }

    /// Field resistance at the current winding temperature.
    pub fn field_resistance_ohm(&self) -> f64 {
        self.params.field_resistance_ohm * self.temperature_factor()
    }

    /// Unshunted field flux (Wb) at the given field current.
    ///
    /// Linear below nominal current, saturated above it.
    pub fn field_flux_wb(&self, current_a: f64) -> f64 {
        if current_a <= 0.0 {
            return 0.0;
        }
        let p = &self.params;
        let nominal = (p.nominal_voltage_v
            - p.nominal_current_a * (self.armature_resistance_ohm() + self.field_resistance_ohm()))
            / p.nominal_speed_rad_s;
        let nominal = nominal.max(0.0);
        if current_a < p.nominal_current_a {
            nominal * current_a / p.nominal_current_a
        } else {
            nominal
        }
    }

    /// Armature current for a field current under the active shunt topology.
    pub fn armature_from_field(&self, field_current_a: f64) -> f64 {
        let rsh = self.params.shunt_resistor_ohm;
        if rsh == 0.0 {
            field_current_a / (1.0 - self.shunt_ratio)
        } else {
            field_current_a * (self.field_resistance_ohm() + rsh) / rsh
        }
    }

    fn series_resistance_ohm(&self) -> f64 {
        self.params.starting_resistor_ohm + self.additional_resistance_ohm
    }

    fn field_current_rate(&self, field_current_a: f64, armature_current_a: f64, omega: f64) -> f64 {
        let field_wb = (1.0 - self.shunt_ratio) * self.field_flux_wb(field_current_a);
        let back_emf = field_wb * omega;
        (self.terminal_voltage_v
            - back_emf
            - armature_current_a * self.armature_resistance_ohm()
            - field_current_a * self.field_resistance_ohm() * (1.0 - self.shunt_ratio)
            - armature_current_a * self.series_resistance_ohm())
            / self.params.field_inductance_h
    }

    /// Number of Euler substeps keeping each one well inside the field time constant.
    fn electrical_substeps(&self, dt: f64, omega: f64) -> usize {
        let gain = self.armature_from_field(1.0);
        let emf_slope =
            (1.0 - self.shunt_ratio) * self.field_flux_wb(self.params.nominal_current_a) * omega.abs()
                / self.params.nominal_current_a;
        let resistance = gain * (self.armature_resistance_ohm() + self.series_resistance_ohm())
            + self.field_resistance_ohm() * (1.0 - self.shunt_ratio)
            + emf_slope;
        if resistance <= 0.0 {
            return 1;
        }
        let tau = self.params.field_inductance_h / resistance;
        ((dt / (0.25 * tau)).ceil() as usize).clamp(1, MAX_ELECTRICAL_SUBSTEPS)
    }

    pub fn save_state(&self) -> SeriesMotorSaveState {
        SeriesMotorSaveState {
            field_current_a: self.field_current_a,
            armature_current_a: self.armature_current_a,
            field_wb: self.field_wb,
            developed_torque_nm: self.common.developed_torque_nm,
            motor_speed_rad_s: self.common.motor_speed_rad_s,
            power_losses_w: self.common.power_losses_w,
            terminal_voltage_v: self.terminal_voltage_v,
            additional_resistance_ohm: self.additional_resistance_ohm,
            shunt_ratio: self.shunt_ratio,
            thermal: self.common.thermal.save_state(),
        }
    }

    pub fn restore(&mut self, state: &SeriesMotorSaveState) {
        self.field_current_a = state.field_current_a;
        self.armature_current_a = state.armature_current_a;
        self.field_wb = state.field_wb;
        self.common.developed_torque_nm = state.developed_torque_nm;
        self.common.motor_speed_rad_s = state.motor_speed_rad_s;
        self.common.power_losses_w = state.power_losses_w;
        self.terminal_voltage_v = state.terminal_voltage_v;
        self.additional_resistance_ohm = state.additional_resistance_ohm;
        self.shunt_ratio = state.shunt_ratio;
        self.common.thermal.restore(&state.thermal);
    }
}

impl ElectricMotor for SeriesMotor {
    fn common(&self) -> &MotorCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut MotorCommon {
        &mut self.common
    }

    fn developed_torque_nm(&self, motor_speed_rad_s: f64) -> f64 {
        self.common
            .apply_friction(self.common.developed_torque_nm, motor_speed_rad_s)
    }

    fn update(&mut self, dt: f64, axle: &AxleKinematics) {
        if dt <= 0.0 {
            return;
        }
        let omega = self.common.motor_speed_from_axle(axle.axle_speed_mps);
        self.common.motor_speed_rad_s = omega;

        let n = self.electrical_substeps(dt, omega);
        let h = dt / n as f64;
        let mut held = false;
        for _ in 0..n {
            let rate = self.field_current_rate(self.field_current_a, self.armature_current_a, omega);
            self.field_current_a += rate * h;
            let back_emf = (1.0 - self.shunt_ratio) * self.field_flux_wb(self.field_current_a) * omega;
            if self.field_current_a < 0.0 || back_emf * self.field_current_a < 0.0 {
                self.field_current_a = 0.0;
                held = true;
            }
            self.armature_current_a = self.armature_from_field(self.field_current_a);
        }
        if held {
            debug!(axle = %axle.axle, omega, "series field current held at zero");
        }

        self.field_wb = (1.0 - self.shunt_ratio) * self.field_flux_wb(self.field_current_a);
        self.common.developed_torque_nm = self.field_wb * self.armature_current_a;
        self.common.power_losses_w = self.armature_resistance_ohm() * self.armature_current_a.powi(2)
            + self.field_resistance_ohm() * self.field_current_a.powi(2);
        self.common.update_thermal(dt);

        trace!(
            axle = %axle.axle,
            field_current_a = self.field_current_a,
            armature_current_a = self.armature_current_a,
            torque_nm = self.common.developed_torque_nm,
            back_emf_v = self.back_emf_v(),
            "series motor update"
        );
    }

    fn reset(&mut self) {
        self.common.motor_speed_rad_s = 0.0;
    }
}
