//! Electric traction motor models.
//!
//! Provides:
//! - `ElectricMotor` capability shared by all drive motors
//! - First-order winding temperature model
//! - DC series motor with field/armature current dynamics and shunting
//! - Slip-controlled induction motor torque clamp
//!
//! Motors are paired with one axle. The pairing is a non-owning association:
//! the motor records the `AxleId` and transmission geometry it was connected
//! with, and receives the axle's kinematic state on every `update`.

pub mod common;
pub mod error;
pub mod induction;
pub mod kind;
pub mod series;
pub mod thermal;
pub mod traits;

pub use common::MotorCommon;
pub use error::{MotorError, MotorResult};
pub use induction::{InductionMotor, InductionMotorParams, InductionMotorSaveState};
pub use kind::{MotorKind, MotorSaveState};
pub use series::{SeriesMotor, SeriesMotorParams, SeriesMotorSaveState};
pub use thermal::{ThermalModel, ThermalParams, ThermalSaveState};
pub use traits::{AxleKinematics, ElectricMotor};
