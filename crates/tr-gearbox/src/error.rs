use thiserror::Error;

pub type GearBoxResult<T> = Result<T, GearBoxError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GearBoxError {
    #[error("Invalid gearbox configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Gear index {index} out of range for {len} gears")]
    GearIndex { index: i32, len: usize },

    #[error("No save state to restore from")]
    MissingSaveState,
}
