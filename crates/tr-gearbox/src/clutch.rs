//! Clutch engagement rules and rate-limited clutch travel.

use crate::engine::{EngineInputs, EngineParams};
use crate::params::{ClutchType, GearBoxOperation, GearBoxType};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shaft/engine RPM band inside which a clutch locks.
const LOCK_BAND_RPM: f64 = 10.0;
/// Relative deviation from demanded RPM that forces a mechanical clutch to slip.
const SLIP_DEVIATION: f64 = 0.1;
/// Speed below which a friction clutch at zero throttle is released (m/s).
const STANDSTILL_MPS: f64 = 0.1;
/// Clutch fraction held while a friction clutch slips in.
const SLIPPING_FRACTION: f64 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClutchCommand {
    Released,
    Slipping,
    Locked,
}

/// Snapshot of the transmission seen by the clutch rules.
pub(crate) struct ClutchContext<'a> {
    pub operation: GearBoxOperation,
    pub gearbox_type: GearBoxType,
    pub clutch_type: ClutchType,
    pub engine: &'a EngineParams,
    pub inputs: &'a EngineInputs,
    pub shaft_rpm: f64,
    /// Shaft RPM at which an automatic/legacy clutch latches on
    pub engage_rpm: f64,
    pub gear_change_active: bool,
    pub shift_requested: bool,
}

/// Clutch fraction in [−1, 1] plus the engagement latch.
///
/// +1 is fully locked in drive, −1 fully locked with the wheels driving the
/// engine, 0 released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Clutch {
    value: f64,
    on: bool,
    lockout: bool,
}

impl Clutch {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn percent(&self) -> f64 {
        (100.0 * self.value).clamp(-100.0, 100.0)
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Fluid/scoop couplings emptied during a gear change stay out until throttle returns.
    pub fn is_locked_out(&self) -> bool {
        self.lockout
    }

    pub(crate) fn from_parts(value: f64, on: bool, lockout: bool) -> Self {
        Self {
            value: value.clamp(-1.0, 1.0),
            on,
            lockout,
        }
    }

    /// Evaluate the engagement rules for this tick and update the latch.
    pub(crate) fn command(&mut self, ctx: &ClutchContext<'_>) -> ClutchCommand {
        let was_on = self.on;
        let command = self.evaluate(ctx);
        if self.on != was_on {
            debug!(on = self.on, shaft_rpm = ctx.shaft_rpm, "clutch state changed");
        }
        command
    }

    fn evaluate(&mut self, ctx: &ClutchContext<'_>) -> ClutchCommand {
        let throttle = ctx.inputs.throttle();
        let engine_rpm = ctx.inputs.real_rpm;

        if ctx.gearbox_type == GearBoxType::Unknown || ctx.operation == GearBoxOperation::Automatic {
            if ctx.shift_requested {
                self.on = false;
            } else if ctx.shaft_rpm >= ctx.engage_rpm {
                self.on = true;
            }
            if ctx.shaft_rpm < ctx.engine.starting_rpm {
                self.on = false;
            }
            return if self.on {
                ClutchCommand::Locked
            } else {
                ClutchCommand::Released
            };
        }

        let fluid = matches!(ctx.clutch_type, ClutchType::Fluid | ClutchType::Scoop);
        if ctx.gear_change_active {
            if fluid && throttle == 0.0 && !self.lockout {
                self.lockout = true;
                debug!("fluid clutch locked out until throttle is reapplied");
            }
            self.on = false;
            return ClutchCommand::Released;
        }
        if self.lockout {
            if throttle > 0.0 {
                self.lockout = false;
            } else {
                self.on = false;
                return ClutchCommand::Released;
            }
        }
        if ctx.clutch_type == ClutchType::Friction
            && throttle == 0.0
            && ctx.inputs.speed_mps.abs() < STANDSTILL_MPS
        {
            self.on = false;
            return ClutchCommand::Released;
        }

        let in_band = (ctx.shaft_rpm - engine_rpm).abs() <= LOCK_BAND_RPM;
        let in_range = engine_rpm >= ctx.engine.idle_rpm && engine_rpm <= ctx.engine.max_rpm;
        if in_band && in_range {
            self.on = true;
        }

        let demanded = ctx.inputs.demanded_rpm;
        let slips_off_demand = !matches!(ctx.gearbox_type, GearBoxType::A | GearBoxType::D);
        if self.on
            && slips_off_demand
            && throttle > 0.0
            && (ctx.shaft_rpm - demanded).abs() > SLIP_DEVIATION * demanded
        {
            self.on = false;
        }

        if self.on {
            ClutchCommand::Locked
        } else if throttle > 0.0 {
            ClutchCommand::Slipping
        } else {
            ClutchCommand::Released
        }
    }

    /// Clutch fraction the mechanism is moving towards.
    pub fn target(command: ClutchCommand, overrunning: bool) -> f64 {
        match command {
            ClutchCommand::Locked if overrunning => -1.0,
            ClutchCommand::Locked => 1.0,
            ClutchCommand::Slipping => SLIPPING_FRACTION,
            ClutchCommand::Released => 0.0,
        }
    }

    /// Move towards `target` at no more than `rate_per_s`.
    pub fn step(&mut self, target: f64, rate_per_s: f64, dt: f64) {
        let max_delta = rate_per_s * dt;
        let delta = (target - self.value).clamp(-max_delta, max_delta);
        self.value = (self.value + delta).clamp(-1.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tr_core::Curve;

    fn engine() -> EngineParams {
        EngineParams {
            idle_rpm: 600.0,
            max_rpm: 1800.0,
            starting_rpm: 400.0,
            governor_rpm: 1900.0,
            max_power_w: 300_000.0,
            torque_curve: Curve::constant(1500.0),
            stall_torque_curve: None,
        }
    }

    fn ctx<'a>(
        engine: &'a EngineParams,
        inputs: &'a EngineInputs,
        operation: GearBoxOperation,
        clutch_type: ClutchType,
        shaft_rpm: f64,
    ) -> ClutchContext<'a> {
        ClutchContext {
            operation,
            gearbox_type: GearBoxType::C,
            clutch_type,
            engine,
            inputs,
            shaft_rpm,
            engage_rpm: 0.35 * engine.max_rpm,
            gear_change_active: false,
            shift_requested: false,
        }
    }

    #[test]
    fn step_is_rate_limited_and_clamped() {
        let mut c = Clutch::default();
        c.step(1.0, 1.0, 0.25);
        assert!((c.value() - 0.25).abs() < 1e-12);
        for _ in 0..10 {
            c.step(1.0, 1.0, 0.25);
        }
        assert_eq!(c.value(), 1.0);
        assert_eq!(c.percent(), 100.0);
        c.step(-1.0, 10.0, 1.0);
        assert_eq!(c.value(), -1.0);
    }

    #[test]
    fn automatic_latch_follows_shaft_rpm() {
        let e = engine();
        let mut inputs = EngineInputs {
            real_rpm: 900.0,
            demanded_rpm: 900.0,
            throttle: 0.5,
            running: true,
            speed_mps: 5.0,
        };
        let mut c = Clutch::default();
        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Automatic, ClutchType::Fluid, 500.0));
        assert_eq!(cmd, ClutchCommand::Released);
        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Automatic, ClutchType::Fluid, 700.0));
        assert_eq!(cmd, ClutchCommand::Locked);
        inputs.throttle = 0.0;
        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Automatic, ClutchType::Fluid, 500.0));
        assert_eq!(cmd, ClutchCommand::Locked);
        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Automatic, ClutchType::Fluid, 300.0));
        assert_eq!(cmd, ClutchCommand::Released);

        // coasting in gear latches on shaft RPM alone
        let mut coasting = Clutch::default();
        let cmd = coasting.command(&ctx(&e, &inputs, GearBoxOperation::Automatic, ClutchType::Fluid, 1000.0));
        assert_eq!(cmd, ClutchCommand::Locked);
        assert!(coasting.is_on());
    }

    #[test]
    fn friction_clutch_slips_in_then_locks() {
        let e = engine();
        let inputs = EngineInputs {
            real_rpm: 1000.0,
            demanded_rpm: 1000.0,
            throttle: 0.6,
            running: true,
            speed_mps: 0.0,
        };
        let mut c = Clutch::default();
        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Manual, ClutchType::Friction, 0.0));
        assert_eq!(cmd, ClutchCommand::Slipping);
        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Manual, ClutchType::Friction, 995.0));
        assert_eq!(cmd, ClutchCommand::Locked);
        assert!(c.is_on());
    }

    #[test]
    fn fluid_clutch_lockout_needs_throttle() {
        let e = engine();
        let mut inputs = EngineInputs {
            real_rpm: 700.0,
            demanded_rpm: 600.0,
            throttle: 0.0,
            running: true,
            speed_mps: 5.0,
        };
        let mut c = Clutch::default();
        let mut changing = ctx(&e, &inputs, GearBoxOperation::Manual, ClutchType::Fluid, 700.0);
        changing.gear_change_active = true;
        assert_eq!(c.command(&changing), ClutchCommand::Released);
        assert!(c.is_locked_out());

        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Manual, ClutchType::Fluid, 700.0));
        assert_eq!(cmd, ClutchCommand::Released);
        assert!(c.is_locked_out());

        inputs.throttle = 0.3;
        inputs.demanded_rpm = 700.0;
        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Manual, ClutchType::Fluid, 700.0));
        assert!(!c.is_locked_out());
        assert_eq!(cmd, ClutchCommand::Locked);
    }

    #[test]
    fn off_demand_rpm_forces_slip_except_types_a_and_d() {
        let e = engine();
        let inputs = EngineInputs {
            real_rpm: 1200.0,
            demanded_rpm: 1600.0,
            throttle: 0.8,
            running: true,
            speed_mps: 8.0,
        };
        let mut c = Clutch::default();
        let cmd = c.command(&ctx(&e, &inputs, GearBoxOperation::Manual, ClutchType::Friction, 1200.0));
        assert_eq!(cmd, ClutchCommand::Slipping);

        let mut c = Clutch::default();
        let mut a = ctx(&e, &inputs, GearBoxOperation::Manual, ClutchType::Friction, 1200.0);
        a.gearbox_type = GearBoxType::A;
        assert_eq!(c.command(&a), ClutchCommand::Locked);
    }

    #[test]
    fn overrun_targets_negative_lock() {
        assert_eq!(Clutch::target(ClutchCommand::Locked, true), -1.0);
        assert_eq!(Clutch::target(ClutchCommand::Locked, false), 1.0);
        assert_eq!(Clutch::target(ClutchCommand::Slipping, false), 0.95);
        assert_eq!(Clutch::target(ClutchCommand::Released, true), 0.0);
    }
}
