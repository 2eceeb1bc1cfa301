//! Gear selection state machine.

use crate::clutch::{Clutch, ClutchContext};
use crate::engine::{EngineInputs, EngineParams};
use crate::error::{GearBoxError, GearBoxResult};
use crate::events::GearBoxEvent;
use crate::gear::Gear;
use crate::params::{GearBoxOperation, GearBoxParams};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Gear index meaning no gear engaged.
pub const NEUTRAL: i32 = -1;
/// Clutch fraction below which the clutch counts as released.
const CLUTCH_RELEASED: f64 = 0.05;
/// Clutch fraction at or above which an automatic down-change may engage.
const CLUTCH_DOWNSHIFT: f64 = 0.5;
/// Clutch fraction at or above which an automatic up-change may engage.
const CLUTCH_UPSHIFT: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GearBoxSaveState {
    pub current_gear_index: i32,
    pub next_gear_index: i32,
    pub clutch_on: bool,
    pub clutch: f64,
    #[serde(default)]
    pub clutch_lockout: bool,
    pub manual_gear_up: bool,
    pub manual_gear_down: bool,
    pub manual_gear_change: bool,
    pub manual_gear_timer_s: f64,
    #[serde(default)]
    pub geared_up: bool,
    #[serde(default)]
    pub geared_down: bool,
    #[serde(default)]
    pub shaft_rpm: f64,
    #[serde(default)]
    pub overspeed_warning: bool,
    #[serde(default)]
    pub overspeed_error: bool,
}

/// Gearbox between an engine and one driven axle.
///
/// `current_gear_index` is the engaged gear and `next_gear_index` the one
/// selected; both lie in `[NEUTRAL, num_of_gears − 1]`. A shift is the
/// moment the two are made equal, and raises one [`GearBoxEvent`].
#[derive(Clone, Debug, PartialEq)]
pub struct GearBox {
    pub(crate) params: GearBoxParams,
    pub(crate) engine: EngineParams,
    pub(crate) wheel_radius_m: f64,
    pub(crate) gears: Vec<Gear>,

    current_gear_index: i32,
    next_gear_index: i32,
    pub(crate) clutch: Clutch,

    manual_gear_up: bool,
    manual_gear_down: bool,
    pub(crate) manual_gear_change: bool,
    manual_gear_timer_s: f64,
    geared_up: bool,
    geared_down: bool,

    shaft_rpm: f64,
    overspeed_warning: bool,
    pub(crate) overspeed_error: bool,

    events: Vec<GearBoxEvent>,
}

impl GearBox {
    pub fn new(params: GearBoxParams, engine: EngineParams, wheel_radius_m: f64) -> GearBoxResult<Self> {
        if !(wheel_radius_m > 0.0) {
            return Err(GearBoxError::InvalidConfig {
                what: "wheel radius must be greater than zero",
            });
        }
        let gears = Gear::build_all(&params, &engine, wheel_radius_m)?;
        Ok(Self {
            params,
            engine,
            wheel_radius_m,
            gears,
            current_gear_index: NEUTRAL,
            next_gear_index: NEUTRAL,
            clutch: Clutch::default(),
            manual_gear_up: false,
            manual_gear_down: false,
            manual_gear_change: false,
            manual_gear_timer_s: 0.0,
            geared_up: false,
            geared_down: false,
            shaft_rpm: 0.0,
            overspeed_warning: false,
            overspeed_error: false,
            events: Vec::new(),
        })
    }

    pub fn params(&self) -> &GearBoxParams {
        &self.params
    }

    pub fn engine(&self) -> &EngineParams {
        &self.engine
    }

    pub fn operation(&self) -> GearBoxOperation {
        self.params.operation
    }

    pub fn gears(&self) -> &[Gear] {
        &self.gears
    }

    pub fn num_of_gears(&self) -> usize {
        self.gears.len()
    }

    fn top_index(&self) -> i32 {
        self.gears.len() as i32 - 1
    }

    fn clamp_index(&self, index: i32) -> i32 {
        index.clamp(NEUTRAL, self.top_index())
    }

    fn gear_at(&self, index: i32) -> Option<&Gear> {
        usize::try_from(index).ok().and_then(|i| self.gears.get(i))
    }

    pub fn current_gear_index(&self) -> i32 {
        self.current_gear_index
    }

    pub fn set_current_gear_index(&mut self, index: i32) {
        self.current_gear_index = self.clamp_index(index);
    }

    pub fn next_gear_index(&self) -> i32 {
        self.next_gear_index
    }

    pub fn set_next_gear_index(&mut self, index: i32) {
        self.next_gear_index = self.clamp_index(index);
    }

    pub fn current_gear(&self) -> Option<&Gear> {
        self.gear_at(self.current_gear_index)
    }

    pub fn next_gear(&self) -> Option<&Gear> {
        self.gear_at(self.next_gear_index)
    }

    pub fn clutch(&self) -> &Clutch {
        &self.clutch
    }

    pub fn clutch_percent(&self) -> f64 {
        self.clutch.percent()
    }

    pub fn is_clutch_on(&self) -> bool {
        self.clutch.is_on()
    }

    pub fn is_manual_gear_up(&self) -> bool {
        self.manual_gear_up
    }

    pub fn is_manual_gear_down(&self) -> bool {
        self.manual_gear_down
    }

    pub fn is_manual_gear_change(&self) -> bool {
        self.manual_gear_change
    }

    /// Time left in the current manual shift (s).
    pub fn manual_gear_timer_s(&self) -> f64 {
        self.manual_gear_timer_s
    }

    /// Shaft RPM seen by the last update.
    pub fn shaft_rpm(&self) -> f64 {
        self.shaft_rpm
    }

    pub fn is_overspeed_warning(&self) -> bool {
        self.overspeed_warning
    }

    pub fn is_overspeed_error(&self) -> bool {
        self.overspeed_error
    }

    /// Engine RPM in neutral, otherwise the wheel RPM through the engaged ratio.
    pub fn compute_shaft_rpm(&self, inputs: &EngineInputs) -> f64 {
        match self.current_gear() {
            Some(gear) => gear.shaft_rpm(inputs.speed_mps, self.wheel_radius_m),
            None => inputs.real_rpm,
        }
    }

    /// Take the events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<GearBoxEvent> {
        std::mem::take(&mut self.events)
    }

    // --- operator and automatic selection ---

    fn start_manual_shift(&mut self) {
        self.manual_gear_change = true;
        self.manual_gear_timer_s = self.params.manual_gear_timer_reset_s;
    }

    /// Operator selects the next gear up.
    pub fn manual_gear_up(&mut self) {
        self.next_gear_index = self.clamp_index(self.next_gear_index + 1);
        self.manual_gear_up = true;
        self.start_manual_shift();
    }

    /// Operator selects the next gear down; below the first gear is neutral.
    pub fn manual_gear_down(&mut self) {
        self.next_gear_index = self.clamp_index(self.next_gear_index - 1);
        self.manual_gear_down = true;
        self.start_manual_shift();
    }

    /// Select one gear up if the clutch is out.
    ///
    /// Successive calls alternate between shifting and re-arming, so a
    /// condition that persists for several ticks moves one gear at a time.
    pub fn auto_gear_up(&mut self) {
        if self.clutch.value() >= CLUTCH_RELEASED {
            return;
        }
        if self.geared_up {
            self.geared_up = false;
            return;
        }
        self.next_gear_index += 1;
        if self.next_gear_index > self.top_index() {
            self.next_gear_index = self.top_index();
        } else {
            self.geared_up = true;
        }
    }

    /// Select one gear down if the clutch is out. Never selects neutral.
    pub fn auto_gear_down(&mut self) {
        if self.clutch.value() >= CLUTCH_RELEASED {
            return;
        }
        if self.geared_down {
            self.geared_down = false;
            return;
        }
        self.next_gear_index -= 1;
        if self.next_gear_index <= 0 {
            self.next_gear_index = 0;
        } else {
            self.geared_down = true;
        }
    }

    /// Automatic gear choice. Returns true while a change is wanted, which
    /// holds the clutch out until the new gear is engaged.
    fn select_automatic(&mut self, inputs: &EngineInputs, shaft_rpm: f64) -> bool {
        let Some(gear) = self.current_gear() else {
            if inputs.throttle() > 0.0 {
                self.auto_gear_up();
            }
            return false;
        };
        let (up_rpm, down_rpm) = (gear.change_up_speed_rpm, gear.change_down_speed_rpm);
        if shaft_rpm > up_rpm && self.current_gear_index < self.top_index() {
            self.auto_gear_up();
            true
        } else if shaft_rpm < down_rpm && self.current_gear_index > 0 {
            self.auto_gear_down();
            true
        } else {
            false
        }
    }

    fn engage(&mut self) {
        let from = self.current_gear_index;
        let to = self.next_gear_index;
        if from == to {
            return;
        }
        self.current_gear_index = to;
        let event = if to > from {
            GearBoxEvent::GearUp { from, to }
        } else {
            GearBoxEvent::GearDown { from, to }
        };
        info!(from, to, operation = ?self.params.operation, "gear engaged");
        self.events.push(event);
    }

    // --- per-tick update ---

    pub fn update(&mut self, elapsed_s: f64, inputs: &EngineInputs) {
        if elapsed_s <= 0.0 {
            return;
        }
        if self.manual_gear_change {
            self.manual_gear_timer_s -= elapsed_s;
            if self.manual_gear_timer_s <= 0.0 {
                self.manual_gear_timer_s = 0.0;
                self.manual_gear_change = false;
            }
        }

        let mut shift_requested = false;
        match self.params.operation {
            GearBoxOperation::Manual => {
                if self.manual_gear_up {
                    if self.next_gear_index > self.current_gear_index {
                        self.engage();
                    }
                    self.manual_gear_up = false;
                }
                if self.manual_gear_down {
                    if self.next_gear_index < self.current_gear_index {
                        self.engage();
                    }
                    self.manual_gear_down = false;
                }
            }
            GearBoxOperation::Automatic | GearBoxOperation::Semiautomatic => {
                if self.params.operation == GearBoxOperation::Automatic {
                    let shaft_rpm = self.compute_shaft_rpm(inputs);
                    shift_requested = self.select_automatic(inputs, shaft_rpm);
                }
                let clutch = self.clutch.value();
                let released = clutch <= CLUTCH_RELEASED;
                if self.next_gear_index > self.current_gear_index && (released || clutch >= CLUTCH_UPSHIFT) {
                    self.engage();
                } else if self.next_gear_index < self.current_gear_index
                    && (released || clutch >= CLUTCH_DOWNSHIFT)
                {
                    self.engage();
                }
                if self.next_gear_index == self.current_gear_index {
                    self.manual_gear_up = false;
                    self.manual_gear_down = false;
                }
            }
        }

        let shaft_rpm = self.compute_shaft_rpm(inputs);
        self.shaft_rpm = shaft_rpm;
        self.update_overspeed(shaft_rpm);

        let engage_rpm = self
            .current_gear()
            .map_or(self.engine.max_rpm, |g| g.down_gear_proportion * self.engine.max_rpm);
        let ctx = ClutchContext {
            operation: self.params.operation,
            gearbox_type: self.params.gearbox_type,
            clutch_type: self.params.clutch_type,
            engine: &self.engine,
            inputs,
            shaft_rpm,
            engage_rpm,
            gear_change_active: self.manual_gear_change,
            shift_requested,
        };
        let mut clutch = self.clutch;
        let command = clutch.command(&ctx);
        let overrunning = inputs.throttle() == 0.0 && shaft_rpm > inputs.real_rpm;
        let target = if self.current_gear_index == NEUTRAL {
            0.0
        } else {
            Clutch::target(command, overrunning)
        };
        clutch.step(target, self.params.clutch_rate_per_s, elapsed_s);
        self.clutch = clutch;
    }

    fn update_overspeed(&mut self, shaft_rpm: f64) {
        let max_rpm = self.engine.max_rpm;
        self.overspeed_warning = self.current_gear().is_some() && shaft_rpm > max_rpm;
        let error = self
            .current_gear()
            .is_some_and(|g| shaft_rpm > max_rpm * g.overspeed_percentage / 100.0);
        if error && !self.overspeed_error {
            warn!(shaft_rpm, max_rpm, gear = self.current_gear_index, "engine overspeed");
        }
        self.overspeed_error = error;
    }

    // --- persistence ---

    pub fn save_state(&self) -> GearBoxSaveState {
        GearBoxSaveState {
            current_gear_index: self.current_gear_index,
            next_gear_index: self.next_gear_index,
            clutch_on: self.clutch.is_on(),
            clutch: self.clutch.value(),
            clutch_lockout: self.clutch.is_locked_out(),
            manual_gear_up: self.manual_gear_up,
            manual_gear_down: self.manual_gear_down,
            manual_gear_change: self.manual_gear_change,
            manual_gear_timer_s: self.manual_gear_timer_s,
            geared_up: self.geared_up,
            geared_down: self.geared_down,
            shaft_rpm: self.shaft_rpm,
            overspeed_warning: self.overspeed_warning,
            overspeed_error: self.overspeed_error,
        }
    }

    pub fn restore(&mut self, state: Option<&GearBoxSaveState>) -> GearBoxResult<()> {
        let state = state.ok_or(GearBoxError::MissingSaveState)?;
        for index in [state.current_gear_index, state.next_gear_index] {
            if index != self.clamp_index(index) {
                return Err(GearBoxError::GearIndex {
                    index,
                    len: self.gears.len(),
                });
            }
        }
        self.current_gear_index = state.current_gear_index;
        self.next_gear_index = state.next_gear_index;
        self.clutch = Clutch::from_parts(state.clutch, state.clutch_on, state.clutch_lockout);
        self.manual_gear_up = state.manual_gear_up;
        self.manual_gear_down = state.manual_gear_down;
        self.manual_gear_change = state.manual_gear_change;
        self.manual_gear_timer_s = state.manual_gear_timer_s;
        self.geared_up = state.geared_up;
        self.geared_down = state.geared_down;
        self.shaft_rpm = state.shaft_rpm;
        self.overspeed_warning = state.overspeed_warning;
        self.overspeed_error = state.overspeed_error;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ClutchType, GearBoxType};
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

    fn gearbox(operation: GearBoxOperation) -> GearBox {
        let mut params = GearBoxParams::with_max_speeds(operation, vec![5.0, 12.0, 25.0]);
        params.gearbox_type = GearBoxType::C;
        params.clutch_type = ClutchType::Friction;
        GearBox::new(params, engine(), 0.5).unwrap()
    }

    fn idle_inputs() -> EngineInputs {
        EngineInputs {
            real_rpm: 600.0,
            demanded_rpm: 600.0,
            throttle: 0.0,
            running: true,
            speed_mps: 0.0,
        }
    }

    #[test]
    fn indices_are_clamped() {
        let mut gb = gearbox(GearBoxOperation::Manual);
        gb.set_next_gear_index(12);
        assert_eq!(gb.next_gear_index(), 2);
        gb.set_current_gear_index(-5);
        assert_eq!(gb.current_gear_index(), NEUTRAL);
        assert!(gb.current_gear().is_none());
        for _ in 0..5 {
            gb.manual_gear_down();
        }
        assert_eq!(gb.next_gear_index(), NEUTRAL);
    }

    #[test]
    fn manual_shift_engages_on_next_update() {
        let mut gb = gearbox(GearBoxOperation::Manual);
        gb.set_current_gear_index(0);
        gb.set_next_gear_index(0);
        gb.manual_gear_up();
        assert_eq!(gb.next_gear_index(), 1);
        assert!(gb.is_manual_gear_up());
        assert!(gb.is_manual_gear_change());

        gb.update(0.1, &idle_inputs());
        assert_eq!(gb.current_gear_index(), 1);
        assert!(!gb.is_manual_gear_up());
        assert_eq!(gb.drain_events(), vec![GearBoxEvent::GearUp { from: 0, to: 1 }]);
        assert!(gb.drain_events().is_empty());
    }

    #[test]
    fn manual_shift_timer_runs_out() {
        let mut gb = gearbox(GearBoxOperation::Manual);
        gb.manual_gear_up();
        assert_eq!(gb.manual_gear_timer_s(), 2.0);
        for _ in 0..19 {
            gb.update(0.1, &idle_inputs());
        }
        assert!(gb.is_manual_gear_change());
        gb.update(0.11, &idle_inputs());
        assert!(!gb.is_manual_gear_change());
        assert_eq!(gb.manual_gear_timer_s(), 0.0);
    }

    #[test]
    fn zero_step_is_noop() {
        let mut gb = gearbox(GearBoxOperation::Automatic);
        let mut inputs = idle_inputs();
        inputs.throttle = 0.5;
        let before = gb.clone();
        gb.update(0.0, &inputs);
        gb.update(-0.5, &inputs);
        assert_eq!(gb, before);
    }

    #[test]
    fn automatic_pulls_away_from_neutral() {
        let mut gb = gearbox(GearBoxOperation::Automatic);
        let mut inputs = idle_inputs();
        inputs.throttle = 0.4;
        gb.update(0.05, &inputs);
        assert_eq!(gb.current_gear_index(), 0);
        assert_eq!(gb.drain_events(), vec![GearBoxEvent::GearUp { from: NEUTRAL, to: 0 }]);
    }

    #[test]
    fn auto_gear_up_alternates_and_clamps() {
        let mut gb = gearbox(GearBoxOperation::Automatic);
        gb.set_next_gear_index(0);
        gb.auto_gear_up();
        assert_eq!(gb.next_gear_index(), 1);
        gb.auto_gear_up();
        assert_eq!(gb.next_gear_index(), 1);
        gb.auto_gear_up();
        assert_eq!(gb.next_gear_index(), 2);
        gb.auto_gear_up();
        gb.auto_gear_up();
        assert_eq!(gb.next_gear_index(), 2);
    }

    #[test]
    fn auto_gear_down_never_reaches_neutral() {
        let mut gb = gearbox(GearBoxOperation::Automatic);
        gb.set_next_gear_index(2);
        for _ in 0..10 {
            gb.auto_gear_down();
        }
        assert_eq!(gb.next_gear_index(), 0);
    }

    #[test]
    fn automatic_upshift_releases_clutch_first() {
        let mut gb = gearbox(GearBoxOperation::Automatic);
        gb.set_current_gear_index(0);
        gb.set_next_gear_index(0);
        gb.restore(Some(&GearBoxSaveState {
            clutch_on: true,
            clutch: 1.0,
            ..gb.save_state()
        }))
        .unwrap();
        let inputs = EngineInputs {
            real_rpm: 1700.0,
            demanded_rpm: 1700.0,
            throttle: 1.0,
            running: true,
            // gear 0 reaches 1800 rpm at 5 m/s
            speed_mps: 4.8,
        };
        let mut shifted_at = None;
        for tick in 0..300 {
            gb.update(0.01, &inputs);
            if gb.current_gear_index() == 1 {
                shifted_at = Some(tick);
                break;
            }
        }
        let tick = shifted_at.expect("no upshift");
        assert!(tick >= 90, "shifted before clutch released: tick {tick}");
        assert!(gb.clutch().value() <= 0.05);
        assert_eq!(gb.drain_events(), vec![GearBoxEvent::GearUp { from: 0, to: 1 }]);
    }

    #[test]
    fn semiautomatic_downshift_window_is_half_clutch() {
        let mut gb = gearbox(GearBoxOperation::Semiautomatic);
        gb.set_current_gear_index(2);
        gb.set_next_gear_index(1);
        gb.restore(Some(&GearBoxSaveState {
            clutch_on: true,
            clutch: 0.6,
            ..gb.save_state()
        }))
        .unwrap();
        gb.update(0.01, &idle_inputs());
        assert_eq!(gb.current_gear_index(), 1);

        gb.set_next_gear_index(2);
        gb.restore(Some(&GearBoxSaveState {
            clutch_on: true,
            clutch: 0.6,
            ..gb.save_state()
        }))
        .unwrap();
        gb.update(0.01, &idle_inputs());
        assert_eq!(gb.current_gear_index(), 1);
    }

    #[test]
    fn restore_validates() {
        let mut gb = gearbox(GearBoxOperation::Manual);
        assert_eq!(gb.restore(None), Err(GearBoxError::MissingSaveState));
        let bad = GearBoxSaveState {
            current_gear_index: 3,
            ..gb.save_state()
        };
        assert!(matches!(gb.restore(Some(&bad)), Err(GearBoxError::GearIndex { index: 3, len: 3 })));
    }

    #[test]
    fn overspeed_flags() {
        let mut gb = gearbox(GearBoxOperation::Manual);
        gb.set_current_gear_index(0);
        let mut inputs = idle_inputs();
        inputs.speed_mps = 6.0;
        gb.update(0.01, &inputs);
        assert!(gb.is_overspeed_warning());
        assert!(!gb.is_overspeed_error());
        inputs.speed_mps = 8.0;
        gb.update(0.01, &inputs);
        assert!(gb.is_overspeed_error());
    }
}
