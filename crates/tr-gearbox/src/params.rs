use crate::error::{GearBoxError, GearBoxResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GearBoxOperation {
    Manual,
    Automatic,
    Semiautomatic,
}

/// Mechanical transmission family.
///
/// `Unknown` selects the legacy behaviour: clutch latched purely on shaft RPM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GearBoxType {
    A,
    B,
    C,
    D,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClutchType {
    Friction,
    Fluid,
    Scoop,
    #[default]
    Unknown,
}

/// Per-gear envelope and gearbox-wide constants.
///
/// Per-gear vectors must all have one entry per gear. Optional vectors are
/// derived from the engine when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GearBoxParams {
    pub operation: GearBoxOperation,
    #[serde(default)]
    pub gearbox_type: GearBoxType,
    #[serde(default)]
    pub clutch_type: ClutchType,
    pub max_speed_mps: Vec<f64>,
    #[serde(default)]
    pub ratios: Option<Vec<f64>>,
    #[serde(default)]
    pub max_tractive_force_n: Option<Vec<f64>>,
    #[serde(default)]
    pub tractive_force_at_max_speed_n: Option<Vec<f64>>,
    #[serde(default = "default_up_gear_proportion")]
    pub up_gear_proportion: f64,
    #[serde(default = "default_down_gear_proportion")]
    pub down_gear_proportion: f64,
    #[serde(default = "default_overspeed_percentage")]
    pub overspeed_percentage: f64,
    #[serde(default = "default_back_load_force_n")]
    pub back_load_force_n: f64,
    #[serde(default = "default_coasting_force_n")]
    pub coasting_force_n: f64,
    #[serde(default)]
    pub direct_drive_gear: Option<usize>,
    #[serde(default)]
    pub free_wheel_fitted: bool,
    #[serde(default = "default_manual_gear_timer_reset_s")]
    pub manual_gear_timer_reset_s: f64,
    #[serde(default = "default_clutch_rate_per_s")]
    pub clutch_rate_per_s: f64,
}

fn default_up_gear_proportion() -> f64 {
    0.85
}

fn default_down_gear_proportion() -> f64 {
    0.35
}

fn default_overspeed_percentage() -> f64 {
    150.0
}

fn default_back_load_force_n() -> f64 {
    1000.0
}

fn default_coasting_force_n() -> f64 {
    500.0
}

fn default_manual_gear_timer_reset_s() -> f64 {
    2.0
}

fn default_clutch_rate_per_s() -> f64 {
    1.0
}

impl GearBoxParams {
    /// Parameters for `max_speed_mps.len()` gears with every optional field defaulted.
    pub fn with_max_speeds(operation: GearBoxOperation, max_speed_mps: Vec<f64>) -> Self {
        Self {
            operation,
            gearbox_type: GearBoxType::default(),
            clutch_type: ClutchType::default(),
            max_speed_mps,
            ratios: None,
            max_tractive_force_n: None,
            tractive_force_at_max_speed_n: None,
            up_gear_proportion: default_up_gear_proportion(),
            down_gear_proportion: default_down_gear_proportion(),
            overspeed_percentage: default_overspeed_percentage(),
            back_load_force_n: default_back_load_force_n(),
            coasting_force_n: default_coasting_force_n(),
            direct_drive_gear: None,
            free_wheel_fitted: false,
            manual_gear_timer_reset_s: default_manual_gear_timer_reset_s(),
            clutch_rate_per_s: default_clutch_rate_per_s(),
        }
    }

    pub fn num_of_gears(&self) -> usize {
        self.max_speed_mps.len()
    }

    pub fn validate(&self) -> GearBoxResult<()> {
        let n = self.num_of_gears();
        if n == 0 {
            return Err(GearBoxError::InvalidConfig {
                what: "gearbox needs at least one gear",
            });
        }
        if self.max_speed_mps.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(GearBoxError::InvalidConfig {
                what: "gear max speeds must be positive",
            });
        }
        for (table, what) in [
            (&self.ratios, "ratio table length must match gear count"),
            (&self.max_tractive_force_n, "max tractive force table length must match gear count"),
            (
                &self.tractive_force_at_max_speed_n,
                "tractive force at max speed table length must match gear count",
            ),
        ] {
            if table.as_ref().is_some_and(|t| t.len() != n) {
                return Err(GearBoxError::InvalidConfig { what });
            }
        }
        if self
            .ratios
            .as_ref()
            .is_some_and(|r| r.iter().any(|v| !(v.is_finite() && *v > 0.0)))
        {
            return Err(GearBoxError::InvalidConfig {
                what: "gear ratios must be positive",
            });
        }
        if !(self.down_gear_proportion > 0.0
            && self.down_gear_proportion < self.up_gear_proportion
            && self.up_gear_proportion <= 1.0)
        {
            return Err(GearBoxError::InvalidConfig {
                what: "gear change proportions must satisfy 0 < down < up <= 1",
            });
        }
        if !(self.overspeed_percentage >= 100.0) {
            return Err(GearBoxError::InvalidConfig {
                what: "overspeed percentage must be at least 100",
            });
        }
        if self.direct_drive_gear.is_some_and(|g| g >= n) {
            return Err(GearBoxError::InvalidConfig {
                what: "direct drive gear must be one of the configured gears",
            });
        }
        if !(self.clutch_rate_per_s > 0.0) {
            return Err(GearBoxError::InvalidConfig {
                what: "clutch rate must be positive",
            });
        }
        if !(self.manual_gear_timer_reset_s >= 0.0) {
            return Err(GearBoxError::InvalidConfig {
                what: "manual gear timer cannot be negative",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults() {
        let yaml = "operation: Manual\nmax_speed_mps: [5.0, 10.0, 20.0]\n";
        let p: GearBoxParams = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(p.gearbox_type, GearBoxType::Unknown);
        assert_eq!(p.clutch_type, ClutchType::Unknown);
        assert_eq!(p.up_gear_proportion, 0.85);
        assert_eq!(p.down_gear_proportion, 0.35);
        assert_eq!(p.overspeed_percentage, 150.0);
        assert_eq!(p.manual_gear_timer_reset_s, 2.0);
        assert_eq!(p, GearBoxParams::with_max_speeds(GearBoxOperation::Manual, vec![5.0, 10.0, 20.0]));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_mismatched_tables() {
        let mut p = GearBoxParams::with_max_speeds(GearBoxOperation::Automatic, vec![5.0, 10.0]);
        p.ratios = Some(vec![4.0]);
        assert!(p.validate().is_err());

        let mut p = GearBoxParams::with_max_speeds(GearBoxOperation::Automatic, vec![]);
        assert!(p.validate().is_err());
        p.max_speed_mps = vec![5.0];
        p.direct_drive_gear = Some(1);
        assert!(p.validate().is_err());
    }
}
