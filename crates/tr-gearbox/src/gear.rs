use crate::engine::EngineParams;
use crate::error::GearBoxResult;
use crate::params::GearBoxParams;
use serde::{Deserialize, Serialize};
use tr_core::wheel_rpm;

/// Operating envelope of one gear.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    pub max_speed_mps: f64,
    /// Engine shaft turns per wheel turn
    pub ratio: f64,
    pub max_tractive_force_n: f64,
    pub tractive_force_at_max_speed_n: f64,
    pub up_gear_proportion: f64,
    pub down_gear_proportion: f64,
    /// Shaft RPM above which an automatic box changes up
    pub change_up_speed_rpm: f64,
    /// Shaft RPM below which an automatic box changes down
    pub change_down_speed_rpm: f64,
    pub overspeed_percentage: f64,
    pub back_load_force_n: f64,
    pub coasting_force_n: f64,
    pub is_direct_drive: bool,
}

impl Gear {
    /// Build the gear list from configuration and the engine envelope.
    ///
    /// Unless ratios are given, each gear is geared so that the engine reaches
    /// max RPM at the gear's max speed.
    pub fn build_all(
        params: &GearBoxParams,
        engine: &EngineParams,
        wheel_radius_m: f64,
    ) -> GearBoxResult<Vec<Gear>> {
        params.validate()?;
        engine.validate()?;
        let max_torque = engine.torque_curve.max_y();
        let gears = params
            .max_speed_mps
            .iter()
            .enumerate()
            .map(|(i, &max_speed)| {
                let ratio = match &params.ratios {
                    Some(r) => r[i],
                    None => engine.max_rpm / wheel_rpm(max_speed, wheel_radius_m),
                };
                let max_tractive_force_n = match &params.max_tractive_force_n {
                    Some(f) => f[i],
                    None => max_torque * ratio / wheel_radius_m,
                };
                let tractive_force_at_max_speed_n = match &params.tractive_force_at_max_speed_n {
                    Some(f) => f[i],
                    None => engine.max_power_w / max_speed,
                };
                Gear {
                    max_speed_mps: max_speed,
                    ratio,
                    max_tractive_force_n,
                    tractive_force_at_max_speed_n,
                    up_gear_proportion: params.up_gear_proportion,
                    down_gear_proportion: params.down_gear_proportion,
                    change_up_speed_rpm: params.up_gear_proportion * engine.max_rpm,
                    change_down_speed_rpm: params.down_gear_proportion * engine.max_rpm,
                    overspeed_percentage: params.overspeed_percentage,
                    back_load_force_n: params.back_load_force_n,
                    coasting_force_n: params.coasting_force_n,
                    is_direct_drive: params.direct_drive_gear == Some(i),
                }
            })
            .collect();
        Ok(gears)
    }

    /// Shaft RPM at the given vehicle speed in this gear.
    pub fn shaft_rpm(&self, speed_mps: f64, wheel_radius_m: f64) -> f64 {
        wheel_rpm(speed_mps.abs(), wheel_radius_m) * self.ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GearBoxOperation;
    use tr_core::Curve;

    fn engine() -> EngineParams {
        EngineParams {
            idle_rpm: 600.0,
            max_rpm: 1800.0,
            starting_rpm: 400.0,
            governor_rpm: 1900.0,
            max_power_w: 300_000.0,
            torque_curve: Curve::new(vec![(600.0, 1500.0), (1200.0, 2000.0), (1800.0, 1600.0)]).unwrap(),
            stall_torque_curve: None,
        }
    }

    #[test]
    fn derived_ratio_reaches_max_rpm_at_max_speed() {
        let params = GearBoxParams::with_max_speeds(GearBoxOperation::Automatic, vec![5.0, 12.0, 25.0]);
        let gears = Gear::build_all(&params, &engine(), 0.5).unwrap();
        assert_eq!(gears.len(), 3);
        for g in &gears {
            assert!((g.shaft_rpm(g.max_speed_mps, 0.5) - 1800.0).abs() < 1e-9);
            assert!((g.change_up_speed_rpm - 0.85 * 1800.0).abs() < 1e-9);
            assert!((g.tractive_force_at_max_speed_n * g.max_speed_mps - 300_000.0).abs() < 1e-6);
        }
        assert!(gears[0].ratio > gears[1].ratio && gears[1].ratio > gears[2].ratio);
        assert!((gears[0].max_tractive_force_n - 2000.0 * gears[0].ratio / 0.5).abs() < 1e-9);
        assert!(!gears.iter().any(|g| g.is_direct_drive));
    }

    #[test]
    fn explicit_tables_win() {
        let mut params = GearBoxParams::with_max_speeds(GearBoxOperation::Manual, vec![5.0, 12.0]);
        params.ratios = Some(vec![8.0, 3.0]);
        params.max_tractive_force_n = Some(vec![90_000.0, 40_000.0]);
        params.direct_drive_gear = Some(1);
        let gears = Gear::build_all(&params, &engine(), 0.5).unwrap();
        assert_eq!(gears[0].ratio, 8.0);
        assert_eq!(gears[1].max_tractive_force_n, 40_000.0);
        assert!(gears[1].is_direct_drive);
    }
}
