//! Error types for motor configuration and pairing.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotorError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Save state does not match motor type: expected {expected}")]
    SaveStateMismatch { expected: &'static str },
}

pub type MotorResult<T> = Result<T, MotorError>;
