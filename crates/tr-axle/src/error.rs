use thiserror::Error;
use tr_motor::MotorError;

pub type AxleResult<T> = Result<T, AxleError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AxleError {
    #[error("Invalid axle configuration: {what} (value={value})")]
    InvalidConfig { what: &'static str, value: f64 },

    #[error("No save state to restore from")]
    MissingSaveState,

    #[error("Motor error: {message}")]
    Motor { message: String },
}

impl From<MotorError> for AxleError {
    fn from(e: MotorError) -> Self {
        AxleError::Motor {
            message: e.to_string(),
        }
    }
}
