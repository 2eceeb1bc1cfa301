//! Tractive force delivered through the engaged gear.

use crate::engine::EngineInputs;
use crate::gear::Gear;
use crate::gearbox::GearBox;
use crate::params::{ClutchType, GearBoxOperation, GearBoxType};
use tr_core::sign;

/// Speed floor for the power/speed force ceiling (m/s).
const MIN_POWER_SPEED_MPS: f64 = 0.1;
/// Engine RPM margin above idle treated as creep for scoop couplings.
const SCOOP_CREEP_MARGIN: f64 = 0.05;

impl GearBox {
    /// Force at the rail (N) for the engaged gear; zero in neutral.
    pub fn tractive_force_n(&self, inputs: &EngineInputs) -> f64 {
        let Some(gear) = self.current_gear() else {
            return 0.0;
        };
        match self.params.operation {
            GearBoxOperation::Automatic => self.automatic_tractive_force_n(gear, inputs),
            GearBoxOperation::Manual | GearBoxOperation::Semiautomatic => {
                self.manual_tractive_force_n(gear, inputs)
            }
        }
    }

    fn power_limit_n(&self, throttle: f64, speed_mps: f64) -> f64 {
        self.engine.max_power_w * throttle / speed_mps.abs().max(MIN_POWER_SPEED_MPS)
    }

    /// Hydraulic transmission: torque curve scaled by throttle.
    fn automatic_tractive_force_n(&self, gear: &Gear, inputs: &EngineInputs) -> f64 {
        if !inputs.running {
            return 0.0;
        }
        let throttle = inputs.throttle();
        let torque = self.engine.torque_curve.eval(inputs.real_rpm) * throttle;
        (torque * gear.ratio / self.wheel_radius_m)
            .min(self.power_limit_n(throttle, inputs.speed_mps))
            .min(gear.max_tractive_force_n)
    }

    /// Throttle after governor action: cut back above max RPM, boosted below idle.
    fn governed_throttle(&self, throttle: f64, rpm: f64) -> f64 {
        let e = &self.engine;
        if rpm > e.max_rpm {
            if e.governor_rpm > e.max_rpm {
                throttle * ((e.governor_rpm - rpm) / (e.governor_rpm - e.max_rpm)).clamp(0.0, 1.0)
            } else {
                0.0
            }
        } else if rpm < e.idle_rpm {
            (throttle + (e.idle_rpm - rpm) / e.idle_rpm).min(1.0)
        } else {
            throttle
        }
    }

    fn is_coasting(&self, shaft_rpm: f64, inputs: &EngineInputs) -> bool {
        let underspeed = self.clutch.is_on()
            && self.params.clutch_type == ClutchType::Friction
            && shaft_rpm < self.engine.starting_rpm;
        self.clutch.value() < 0.0 || !inputs.running || self.overspeed_error || underspeed
    }

    /// Drag of an unfuelled engine dragged through the gear, opposing motion.
    pub(crate) fn coasting_force_n(&self, gear: &Gear, shaft_rpm: f64, speed_mps: f64) -> f64 {
        let gov = self.engine.governor_rpm;
        let gradient = match &self.engine.stall_torque_curve {
            Some(stall) => stall.eval(gov) * gear.ratio / (self.wheel_radius_m * gov),
            None => gear.coasting_force_n / gov,
        };
        let drag = gear.coasting_force_n + gradient * (shaft_rpm - self.engine.idle_rpm).max(0.0);
        -sign(speed_mps) * drag.min(gear.max_tractive_force_n)
    }

    /// Mechanical transmission through a clutch.
    fn manual_tractive_force_n(&self, gear: &Gear, inputs: &EngineInputs) -> f64 {
        let throttle = inputs.throttle();
        let rpm = inputs.real_rpm;
        let shaft_rpm = self.compute_shaft_rpm(inputs);

        if self.params.gearbox_type == GearBoxType::B && self.manual_gear_change {
            return 0.0;
        }
        if self.params.clutch_type == ClutchType::Scoop
            && throttle == 0.0
            && rpm <= self.engine.idle_rpm * (1.0 + SCOOP_CREEP_MARGIN)
        {
            return 0.0;
        }
        if self.params.free_wheel_fitted && shaft_rpm > rpm {
            return 0.0;
        }
        if self.is_coasting(shaft_rpm, inputs) {
            return self.coasting_force_n(gear, shaft_rpm, inputs.speed_mps);
        }

        let throttle = self.governed_throttle(throttle, rpm);
        let rpm_ratio = rpm / self.engine.max_rpm;
        let multiplier = 0.824 * throttle + 0.176 + (0.785 * throttle - 0.785) * rpm_ratio;
        let mut force = self.engine.torque_curve.eval(rpm) * multiplier * gear.ratio / self.wheel_radius_m;
        if force > 0.0 {
            force = force.min(self.power_limit_n(throttle, inputs.speed_mps));
        }
        force = force.min(gear.max_tractive_force_n);
        if !self.clutch.is_on() {
            force *= self.clutch.value().clamp(0.0, 1.0);
        }
        force
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{EngineInputs, EngineParams};
    use crate::gearbox::{GearBox, GearBoxSaveState};
    use crate::params::{ClutchType, GearBoxOperation, GearBoxParams, GearBoxType};
    use tr_core::Curve;

    fn engine(stall: Option<Curve>) -> EngineParams {
        EngineParams {
            idle_rpm: 600.0,
            max_rpm: 1800.0,
            starting_rpm: 400.0,
            governor_rpm: 1900.0,
            max_power_w: 300_000.0,
            torque_curve: Curve::constant(1500.0),
            stall_torque_curve: stall,
        }
    }

    fn gearbox(operation: GearBoxOperation, clutch_type: ClutchType) -> GearBox {
        let mut params = GearBoxParams::with_max_speeds(operation, vec![5.0, 12.0, 25.0]);
        params.gearbox_type = GearBoxType::C;
        params.clutch_type = clutch_type;
        let mut gb = GearBox::new(params, engine(None), 0.5).unwrap();
        gb.set_current_gear_index(1);
        gb.set_next_gear_index(1);
        gb
    }

    fn lock_clutch(gb: &mut GearBox, value: f64, on: bool) {
        let state = GearBoxSaveState {
            clutch: value,
            clutch_on: on,
            ..gb.save_state()
        };
        gb.restore(Some(&state)).unwrap();
    }

    fn inputs(rpm: f64, throttle: f64, speed_mps: f64) -> EngineInputs {
        EngineInputs {
            real_rpm: rpm,
            demanded_rpm: rpm,
            throttle,
            running: true,
            speed_mps,
        }
    }

    #[test]
    fn neutral_gives_no_force() {
        let mut gb = gearbox(GearBoxOperation::Automatic, ClutchType::Fluid);
        gb.set_current_gear_index(-1);
        assert_eq!(gb.tractive_force_n(&inputs(1500.0, 1.0, 3.0)), 0.0);
    }

    #[test]
    fn automatic_force_scales_with_throttle_and_caps() {
        let gb = gearbox(GearBoxOperation::Automatic, ClutchType::Fluid);
        let ratio = gb.current_gear().unwrap().ratio;
        let f = gb.tractive_force_n(&inputs(1200.0, 0.5, 10.0));
        let expected = (1500.0 * 0.5 * ratio / 0.5).min(300_000.0 * 0.5 / 10.0);
        assert!((f - expected).abs() < 1e-9);

        let fast = gb.tractive_force_n(&inputs(1200.0, 1.0, 40.0));
        assert!((fast - 300_000.0 / 40.0).abs() < 1e-9);

        let mut stopped = inputs(1200.0, 1.0, 10.0);
        stopped.running = false;
        assert_eq!(gb.tractive_force_n(&stopped), 0.0);
    }

    #[test]
    fn manual_full_throttle_multiplier_is_unity() {
        let mut gb = gearbox(GearBoxOperation::Manual, ClutchType::Friction);
        lock_clutch(&mut gb, 1.0, true);
        let ratio = gb.current_gear().unwrap().ratio;
        let f = gb.tractive_force_n(&inputs(1200.0, 1.0, 10.0));
        let raw = 1500.0 * ratio / 0.5;
        assert!((f - raw.min(300_000.0 / 10.0)).abs() < 1e-6);
    }

    #[test]
    fn slipping_clutch_scales_force() {
        let mut gb = gearbox(GearBoxOperation::Manual, ClutchType::Friction);
        lock_clutch(&mut gb, 1.0, true);
        let locked = gb.tractive_force_n(&inputs(1200.0, 1.0, 10.0));
        lock_clutch(&mut gb, 0.5, false);
        let slipping = gb.tractive_force_n(&inputs(1200.0, 1.0, 10.0));
        assert!((slipping - 0.5 * locked).abs() < 1e-6);
    }

    #[test]
    fn overrunning_clutch_coasts_against_motion() {
        let mut gb = gearbox(GearBoxOperation::Manual, ClutchType::Friction);
        lock_clutch(&mut gb, -1.0, true);
        let forward = gb.tractive_force_n(&inputs(600.0, 0.0, 5.0));
        assert!(forward < 0.0);
        let backward = gb.tractive_force_n(&inputs(600.0, 0.0, -5.0));
        assert!((forward + backward).abs() < 1e-9);
    }

    #[test]
    fn coasting_gradient_from_stall_curve() {
        let mut params = GearBoxParams::with_max_speeds(GearBoxOperation::Manual, vec![10.0]);
        params.gearbox_type = GearBoxType::A;
        params.clutch_type = ClutchType::Friction;
        let mut gb = GearBox::new(params, engine(Some(Curve::constant(200.0))), 0.5).unwrap();
        gb.set_current_gear_index(0);
        let gear = gb.current_gear().unwrap().clone();
        let shaft = 1000.0;
        let f = gb.coasting_force_n(&gear, shaft, 2.0);
        let g = 200.0 * gear.ratio / (0.5 * 1900.0);
        let expected = (500.0 + g * (shaft - 600.0)).min(gear.max_tractive_force_n);
        assert!((f + expected).abs() < 1e-9);

        let plain = GearBox::new(
            GearBoxParams::with_max_speeds(GearBoxOperation::Manual, vec![10.0]),
            engine(None),
            0.5,
        )
        .unwrap();
        let f = plain.coasting_force_n(&gear, 600.0, 2.0);
        assert!((f + 500.0).abs() < 1e-9);
    }

    #[test]
    fn freewheel_and_scoop_cut_force() {
        let mut gb = gearbox(GearBoxOperation::Manual, ClutchType::Scoop);
        lock_clutch(&mut gb, 1.0, true);
        assert_eq!(gb.tractive_force_n(&inputs(610.0, 0.0, 1.0)), 0.0);

        let mut params = GearBoxParams::with_max_speeds(GearBoxOperation::Manual, vec![5.0, 12.0, 25.0]);
        params.gearbox_type = GearBoxType::C;
        params.clutch_type = ClutchType::Friction;
        params.free_wheel_fitted = true;
        let mut fw = GearBox::new(params, engine(None), 0.5).unwrap();
        fw.set_current_gear_index(1);
        lock_clutch(&mut fw, 1.0, true);
        // 10 m/s in second gear puts the shaft at 1500 rpm
        assert_eq!(fw.tractive_force_n(&inputs(900.0, 0.5, 10.0)), 0.0);
        assert!(fw.tractive_force_n(&inputs(1600.0, 0.5, 10.0)) > 0.0);
    }

    #[test]
    fn governor_cuts_throttle_above_max_rpm() {
        let gb = gearbox(GearBoxOperation::Manual, ClutchType::Friction);
        assert_eq!(gb.governed_throttle(1.0, 1900.0), 0.0);
        assert!((gb.governed_throttle(1.0, 1850.0) - 0.5).abs() < 1e-12);
        assert_eq!(gb.governed_throttle(0.4, 1000.0), 0.4);
        assert!((gb.governed_throttle(0.0, 300.0) - 0.5).abs() < 1e-12);
    }
}
