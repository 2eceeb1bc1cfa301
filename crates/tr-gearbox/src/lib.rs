//! Gear selection, clutch engagement and tractive force for mechanical and
//! hydraulic transmissions driven by a combustion engine.

pub mod clutch;
pub mod engine;
pub mod error;
pub mod events;
pub mod gear;
pub mod gearbox;
pub mod params;
pub mod tractive;

pub use clutch::{Clutch, ClutchCommand};
pub use engine::{EngineInputs, EngineParams};
pub use error::{GearBoxError, GearBoxResult};
pub use events::GearBoxEvent;
pub use gear::Gear;
pub use gearbox::{GearBox, GearBoxSaveState, NEUTRAL};
pub use params::{ClutchType, GearBoxOperation, GearBoxParams, GearBoxType};
