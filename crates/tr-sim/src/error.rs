//! Error types for vehicle simulation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Save state does not fit this vehicle: {what}")]
    SaveStateMismatch { what: &'static str },

    #[error("Axle error: {0}")]
    Axle(#[from] tr_axle::AxleError),

    #[error("Motor error: {0}")]
    Motor(#[from] tr_motor::MotorError),

    #[error("Gearbox error: {0}")]
    GearBox(#[from] tr_gearbox::GearBoxError),

    #[error("Project error: {0}")]
    Project(#[from] tr_project::ProjectError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
