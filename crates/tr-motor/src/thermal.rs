//! Lumped first-order winding temperature model.

use crate::error::{MotorError, MotorResult};
use serde::{Deserialize, Serialize};

/// Thermal constants of a motor winding.
///
/// Dynamics: dT/dt = (1/(C·m)) · ((P_loss − P_cool)/(h·A) − T)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalParams {
    /// Heat transfer coefficient h (W/m²K)
    pub thermal_coeff_w_m2k: f64,
    /// Cooled surface A (m²)
    pub surface_m2: f64,
    /// Specific heat capacity C (J/kgK)
    pub specific_heat_j_kgk: f64,
    /// Winding mass m (kg)
    pub weight_kg: f64,
    /// Power removed by forced cooling (W)
    #[serde(default)]
    pub cooling_power_w: f64,
    #[serde(default = "default_initial_temperature_k")]
    pub initial_temperature_k: f64,
}

fn default_initial_temperature_k() -> f64 {
    293.15
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            thermal_coeff_w_m2k: 20.0,
            surface_m2: 1.5,
            specific_heat_j_kgk: 0.4,
            weight_kg: 1000.0,
            cooling_power_w: 0.0,
            initial_temperature_k: default_initial_temperature_k(),
        }
    }
}

impl ThermalParams {
    pub fn validate(&self) -> MotorResult<()> {
        let positive = [
            (self.thermal_coeff_w_m2k, "thermal coefficient must be positive"),
            (self.surface_m2, "cooled surface must be positive"),
            (self.specific_heat_j_kgk, "specific heat capacity must be positive"),
            (self.weight_kg, "winding weight must be positive"),
        ];
        for (value, what) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MotorError::InvalidArg { what });
            }
        }
        if !self.initial_temperature_k.is_finite() || self.initial_temperature_k < 0.0 {
            return Err(MotorError::InvalidArg {
                what: "initial temperature must be a finite absolute temperature",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalSaveState {
    pub temperature_k: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermalModel {
    params: ThermalParams,
    temperature_k: f64,
}

impl ThermalModel {
    pub fn new(params: ThermalParams) -> MotorResult<Self> {
        params.validate()?;
        Ok(Self {
            temperature_k: params.initial_temperature_k,
            params,
        })
    }

    pub fn params(&self) -> &ThermalParams {
        &self.params
    }

    pub fn temperature_k(&self) -> f64 {
        self.temperature_k
    }

    /// Temperature derivative (K/s) at the given losses.
    pub fn dtdt(&self, temperature_k: f64, power_losses_w: f64) -> f64 {
        let p = &self.params;
        let heat_capacity = p.specific_heat_j_kgk * p.weight_kg;
        let conductance = p.thermal_coeff_w_m2k * p.surface_m2;
        ((power_losses_w - p.cooling_power_w) / conductance - temperature_k) / heat_capacity
    }

    /// Advance by `dt` with forward Euler.
    pub fn update(&mut self, dt: f64, power_losses_w: f64) {
        if dt <= 0.0 {
            return;
        }
        self.temperature_k += self.dtdt(self.temperature_k, power_losses_w) * dt;
    }

    pub fn save_state(&self) -> ThermalSaveState {
        ThermalSaveState {
            temperature_k: self.temperature_k,
        }
    }

    pub fn restore(&mut self, state: &ThermalSaveState) {
        self.temperature_k = state.temperature_k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_capacity() {
        let params = ThermalParams {
            weight_kg: 0.0,
            ..ThermalParams::default()
        };
        assert!(ThermalModel::new(params).is_err());
    }

    #[test]
    fn relaxes_towards_equilibrium() {
        let params = ThermalParams {
            initial_temperature_k: 300.0,
            ..ThermalParams::default()
        };
        let conductance = params.thermal_coeff_w_m2k * params.surface_m2;
        let losses = 400.0 * conductance;
        let mut model = ThermalModel::new(params).unwrap();

        let mut last = model.temperature_k();
        for _ in 0..2000 {
            model.update(1.0, losses);
            assert!(model.temperature_k() >= last);
            last = model.temperature_k();
        }
        // C·m = 400 s; 2000 s is five time constants
        assert!((model.temperature_k() - 400.0).abs() < 1.0);
    }

    #[test]
    fn zero_dt_is_noop() {
        let mut model = ThermalModel::new(ThermalParams::default()).unwrap();
        let t0 = model.temperature_k();
        model.update(0.0, 1.0e6);
        model.update(-1.0, 1.0e6);
        assert_eq!(model.temperature_k(), t0);
    }
}
