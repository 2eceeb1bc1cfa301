use crate::error::{AxleError, AxleResult};
use serde::{Deserialize, Serialize};

/// Efficiency substituted when a transmission is configured with zero efficiency.
pub const DEFAULT_TRANSMISSION_EFFICIENCY: f64 = 0.99;

/// Static description of a wheelset, as read from vehicle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxleParams {
    /// Wheelset moment of inertia (kg·m²)
    pub inertia_kgm2: f64,
    pub wheel_radius_m: f64,
    #[serde(default = "default_transmission_ratio")]
    pub transmission_ratio: f64,
    #[serde(default = "default_transmission_efficiency")]
    pub transmission_efficiency: f64,
    /// Peak adhesion coefficient (umax)
    pub adhesion_limit: f64,
    /// Curve shape constant K (km/h)
    #[serde(default = "default_adhesion_k")]
    pub adhesion_k: f64,
    #[serde(default = "default_slip_warning_threshold_percent")]
    pub slip_warning_threshold_percent: f64,
    /// Weight on the rail (N)
    pub axle_weight_n: f64,
    #[serde(default)]
    pub friction_n: f64,
    #[serde(default)]
    pub damping_ns: f64,
}

fn default_transmission_ratio() -> f64 {
    1.0
}

fn default_transmission_efficiency() -> f64 {
    DEFAULT_TRANSMISSION_EFFICIENCY
}

fn default_adhesion_k() -> f64 {
    0.7
}

fn default_slip_warning_threshold_percent() -> f64 {
    70.0
}

impl AxleParams {
    pub fn validate(&self) -> AxleResult<()> {
        check_positive(self.inertia_kgm2, "axle inertia must be greater than zero")?;
        check_positive(self.wheel_radius_m, "wheel radius must be greater than zero")?;
        check_positive(self.transmission_ratio, "transmission ratio must be greater than zero")?;
        check_efficiency(self.transmission_efficiency)?;
        check_positive(self.adhesion_limit, "adhesion limit must be greater than zero")?;
        check_positive(self.adhesion_k, "adhesion K must be greater than zero")?;
        if !(self.axle_weight_n >= 0.0) {
            return Err(AxleError::InvalidConfig {
                what: "axle weight cannot be negative",
                value: self.axle_weight_n,
            });
        }
        Ok(())
    }
}

pub(crate) fn check_positive(value: f64, what: &'static str) -> AxleResult<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(AxleError::InvalidConfig { what, value })
    }
}

/// Efficiency in (0, 1]; exactly zero selects the default.
pub(crate) fn check_efficiency(value: f64) -> AxleResult<f64> {
    if value == 0.0 {
        return Ok(DEFAULT_TRANSMISSION_EFFICIENCY);
    }
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(AxleError::InvalidConfig {
            what: "transmission efficiency must be in (0, 1]",
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let json = r#"{
            "inertia_kgm2": 200.0,
            "wheel_radius_m": 0.5,
            "adhesion_limit": 0.33,
            "axle_weight_n": 100000.0
        }"#;
        let p: AxleParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.adhesion_k, 0.7);
        assert_eq!(p.slip_warning_threshold_percent, 70.0);
        assert_eq!(p.transmission_ratio, 1.0);
        assert_eq!(p.transmission_efficiency, 0.99);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn efficiency_zero_maps_to_default() {
        assert_eq!(check_efficiency(0.0).unwrap(), 0.99);
        assert_eq!(check_efficiency(1.0).unwrap(), 1.0);
        assert!(check_efficiency(1.2).is_err());
        assert!(check_efficiency(-0.5).is_err());
        assert!(check_efficiency(f64::NAN).is_err());
    }
}
