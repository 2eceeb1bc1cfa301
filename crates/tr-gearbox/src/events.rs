use serde::{Deserialize, Serialize};

/// Notifications raised when a gear engages.
///
/// Consumers (sound, cab displays) drain them after each update; nothing is
/// expected back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GearBoxEvent {
    GearUp { from: i32, to: i32 },
    GearDown { from: i32, to: i32 },
}
