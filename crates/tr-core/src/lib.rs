//! tr-core: shared foundation for the traction dynamics crates.
//!
//! Contains:
//! - units (uom-backed speed and rotation conversions)
//! - numeric (Real, sign and angle helpers)
//! - ids (compact identifiers pairing motors with axles)
//! - curve (piecewise-linear lookup tables)
//! - error (shared error types)

pub mod curve;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use curve::Curve;
pub use error::{TrError, TrResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
