//! Tagged union over the concrete motor variants.

use crate::common::MotorCommon;
use crate::error::{MotorError, MotorResult};
use crate::induction::{InductionMotor, InductionMotorSaveState};
use crate::series::{SeriesMotor, SeriesMotorSaveState};
use crate::traits::{AxleKinematics, ElectricMotor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum MotorKind {
    Series(SeriesMotor),
    Induction(InductionMotor),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MotorSaveState {
    Series(SeriesMotorSaveState),
    Induction(InductionMotorSaveState),
}

impl MotorKind {
    fn as_motor(&self) -> &dyn ElectricMotor {
        match self {
            MotorKind::Series(m) => m,
            MotorKind::Induction(m) => m,
        }
    }

    fn as_motor_mut(&mut self) -> &mut dyn ElectricMotor {
        match self {
            MotorKind::Series(m) => m,
            MotorKind::Induction(m) => m,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MotorKind::Series(_) => "series",
            MotorKind::Induction(_) => "induction",
        }
    }

    pub fn save_state(&self) -> MotorSaveState {
        match self {
            MotorKind::Series(m) => MotorSaveState::Series(m.save_state()),
            MotorKind::Induction(m) => MotorSaveState::Induction(m.save_state()),
        }
    }

    pub fn restore(&mut self, state: &MotorSaveState) -> MotorResult<()> {
        match (self, state) {
            (MotorKind::Series(m), MotorSaveState::Series(s)) => m.restore(s),
            (MotorKind::Induction(m), MotorSaveState::Induction(s)) => m.restore(s),
            (MotorKind::Series(_), _) => {
                return Err(MotorError::SaveStateMismatch { expected: "series" });
            }
            (MotorKind::Induction(_), _) => {
                return Err(MotorError::SaveStateMismatch {
                    expected: "induction",
                });
            }
        }
        Ok(())
    }
}

impl ElectricMotor for MotorKind {
    fn common(&self) -> &MotorCommon {
        self.as_motor().common()
    }

    fn common_mut(&mut self) -> &mut MotorCommon {
        self.as_motor_mut().common_mut()
    }

    fn developed_torque_nm(&self, motor_speed_rad_s: f64) -> f64 {
        self.as_motor().developed_torque_nm(motor_speed_rad_s)
    }

    fn update(&mut self, dt: f64, axle: &AxleKinematics) {
        self.as_motor_mut().update(dt, axle)
    }

    fn reset(&mut self) {
        self.as_motor_mut().reset()
    }
}

impl From<SeriesMotor> for MotorKind {
    fn from(m: SeriesMotor) -> Self {
        MotorKind::Series(m)
    }
}

impl From<InductionMotor> for MotorKind {
    fn from(m: InductionMotor) -> Self {
        MotorKind::Induction(m)
    }
}
