//! Wheelset traction and braking dynamics.
//!
//! Provides:
//! - Curtius–Kniffler style adhesion curve and its inverse
//! - Adaptive substep controller for the RK4 axle integrator
//! - `Axle`: rotational state, rail reaction, stiction, slip detection
//! - Explicit save state for restore across sessions

pub mod adhesion;
pub mod axle;
pub mod error;
pub mod integrator;
pub mod params;
pub mod slip;

pub use adhesion::{slip_characteristics, slip_characteristics_inverse};
pub use axle::{Axle, AxleDrive, AxleDriveType, AxleSaveState, MotionVariation};
pub use error::{AxleError, AxleResult};
pub use integrator::SubstepController;
pub use params::AxleParams;
pub use slip::DwellDetector;
