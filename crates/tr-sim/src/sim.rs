//! Scenario runner and result recording.

use crate::error::{SimError, SimResult};
use crate::powertrain::Powertrain;
use crate::schedule::ControlSchedule;
use serde::Serialize;
use tr_gearbox::GearBoxEvent;
use tr_motor::ElectricMotor;
use tr_project::ScenarioDef;
use tracing::{debug, info};

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1e-2,
            t_end: 10.0,
            max_steps: 1_000_000,
            record_every: 10,
        }
    }
}

impl SimOptions {
    pub fn from_scenario(scenario: &ScenarioDef) -> Self {
        Self {
            dt: scenario.dt_s,
            t_end: scenario.t_end_s,
            record_every: scenario.record_every,
            ..Self::default()
        }
    }
}

/// Observables of one recorded tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimSample {
    pub axle_speed_mps: f64,
    pub train_speed_mps: f64,
    pub slip_speed_mps: f64,
    pub slip_speed_percent: f64,
    pub axle_force_n: f64,
    pub drive_force_n: f64,
    pub substeps: u32,
    pub wheel_slip: bool,
    pub throttle: f64,
    pub brake_force_n: f64,
    pub gear: Option<i32>,
    pub clutch_percent: Option<f64>,
    pub engine_rpm: Option<f64>,
    pub motor_torque_nm: Option<f64>,
}

impl SimSample {
    fn capture(p: &Powertrain, throttle: f64, brake_force_n: f64) -> Self {
        let axle = p.axle();
        Self {
            axle_speed_mps: axle.axle_speed_mps(),
            train_speed_mps: axle.train_speed_mps,
            slip_speed_mps: axle.slip_speed_mps(),
            slip_speed_percent: axle.slip_speed_percent(),
            axle_force_n: axle.axle_force_n(),
            drive_force_n: axle.drive_force_n,
            substeps: axle.num_of_substeps(),
            wheel_slip: axle.is_wheel_slip(),
            throttle,
            brake_force_n,
            gear: p.gearbox().map(|g| g.current_gear_index()),
            clutch_percent: p.gearbox().map(|g| g.clutch_percent()),
            engine_rpm: p.engine().map(|e| e.real_rpm()),
            motor_torque_nm: axle.motor().map(|m| m.common().developed_torque_nm),
        }
    }
}

/// Record of simulation results.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points (seconds)
    pub t: Vec<f64>,
    pub x: Vec<SimSample>,
    /// Gearbox events with the time of the tick that raised them
    pub events: Vec<(f64, GearBoxEvent)>,
}

impl SimRecord {
    pub fn last(&self) -> Option<&SimSample> {
        self.x.last()
    }

    /// Comma-separated table, one row per recorded sample.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "t_s,axle_speed_mps,train_speed_mps,slip_speed_mps,slip_percent,axle_force_n,drive_force_n,substeps,wheel_slip,throttle,brake_force_n,gear,clutch_percent,engine_rpm,motor_torque_nm\n",
        );
        let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        for (t, s) in self.t.iter().zip(&self.x) {
            out.push_str(&format!(
                "{t},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                s.axle_speed_mps,
                s.train_speed_mps,
                s.slip_speed_mps,
                s.slip_speed_percent,
                s.axle_force_n,
                s.drive_force_n,
                s.substeps,
                u8::from(s.wheel_slip),
                s.throttle,
                s.brake_force_n,
                s.gear.map(|g| g.to_string()).unwrap_or_default(),
                opt(s.clutch_percent),
                opt(s.engine_rpm),
                opt(s.motor_torque_nm),
            ));
        }
        out
    }
}

/// Step `powertrain` from its current time to `opts.t_end`.
///
/// Controls come from `schedule`, which is advanced to the start time of each
/// tick. Resuming from a save state continues the same sequence of ticks.
pub fn run_scenario(
    powertrain: &mut Powertrain,
    schedule: &mut ControlSchedule,
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    if !(opts.dt > 0.0) {
        return Err(SimError::InvalidArg {
            what: "dt must be positive",
        });
    }
    if opts.t_end < 0.0 {
        return Err(SimError::InvalidArg {
            what: "t_end must be non-negative",
        });
    }
    if opts.max_steps == 0 || opts.record_every == 0 {
        return Err(SimError::InvalidArg {
            what: "max_steps and record_every must be positive",
        });
    }

    info!(
        t_start = powertrain.time_s(),
        t_end = opts.t_end,
        dt = opts.dt,
        "scenario started"
    );

    let mut record = SimRecord::default();
    let controls = schedule.current();
    record.t.push(powertrain.time_s());
    record
        .x
        .push(SimSample::capture(powertrain, controls.throttle, controls.brake_force_n));

    let mut step = 0;
    while powertrain.time_s() < opts.t_end - 0.5 * opts.dt && step < opts.max_steps {
        let t = powertrain.time_s();
        for command in schedule.advance(t) {
            powertrain.gear_command(command)?;
        }
        let controls = schedule.current();
        for event in powertrain.step(opts.dt, controls) {
            record.events.push((t, event));
        }
        step += 1;

        let recorded = step % opts.record_every == 0;
        let finished = powertrain.time_s() >= opts.t_end - 0.5 * opts.dt;
        if recorded || finished {
            let sample = SimSample::capture(powertrain, controls.throttle, controls.brake_force_n);
            debug!(
                t = powertrain.time_s(),
                axle_speed_mps = sample.axle_speed_mps,
                axle_force_n = sample.axle_force_n,
                "sample"
            );
            record.t.push(powertrain.time_s());
            record.x.push(sample);
        }
    }

    let last = record.last();
    info!(
        steps = step,
        t = powertrain.time_s(),
        axle_speed_mps = last.map(|s| s.axle_speed_mps),
        events = record.events.len(),
        "scenario finished"
    );
    Ok(record)
}
