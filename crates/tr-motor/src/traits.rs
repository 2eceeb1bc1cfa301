//! Capability interface implemented by every drive motor.

use crate::common::MotorCommon;
use tr_core::AxleId;

/// Kinematic state of the axle a motor is paired with, sampled once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxleKinematics {
    pub axle: AxleId,
    /// Wheel surface speed (m/s)
    pub axle_speed_mps: f64,
    /// Vehicle speed over ground (m/s)
    pub train_speed_mps: f64,
    /// Slip speed at which adhesion peaks (m/s)
    pub wheel_slip_threshold_mps: f64,
}

/// A prime mover driving one axle through a fixed transmission ratio.
///
/// Torque is queried at hypothetical motor speeds while the axle integrates,
/// so `developed_torque_nm` must not mutate state. `update` advances internal
/// dynamics once per tick, before the axle integrates.
pub trait ElectricMotor {
    fn common(&self) -> &MotorCommon;

    fn common_mut(&mut self) -> &mut MotorCommon;

    /// Shaft torque (N·m) at the given motor speed (rad/s), net of friction.
    fn developed_torque_nm(&self, motor_speed_rad_s: f64) -> f64;

    /// Advance electrical and thermal state by `dt` seconds.
    fn update(&mut self, dt: f64, axle: &AxleKinematics);

    /// Zero rotational state; electrical and thermal state are kept.
    fn reset(&mut self);

    fn inertia_kgm2(&self) -> f64 {
        self.common().inertia_kgm2()
    }

    fn temperature_k(&self) -> f64 {
        self.common().thermal.temperature_k()
    }
}
