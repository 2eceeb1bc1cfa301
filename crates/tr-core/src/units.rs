// tr-core/src/units.rs

use uom::si::f64::{AngularVelocity as UomAngularVelocity, Velocity as UomVelocity};

// Public canonical unit types (SI, f64)
pub type AngularVelocity = UomAngularVelocity;
pub type Velocity = UomVelocity;

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn kph(v: f64) -> Velocity {
    use uom::si::velocity::kilometer_per_hour;
    Velocity::new::<kilometer_per_hour>(v)
}

#[inline]
pub fn rpm(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::revolution_per_minute;
    AngularVelocity::new::<revolution_per_minute>(v)
}

/// km/h → m/s on raw values.
#[inline]
pub fn kph_to_mps(v_kph: f64) -> f64 {
    use uom::si::velocity::meter_per_second;
    kph(v_kph).get::<meter_per_second>()
}

/// m/s → km/h on raw values.
#[inline]
pub fn mps_to_kph(v_mps: f64) -> f64 {
    use uom::si::velocity::kilometer_per_hour;
    mps(v_mps).get::<kilometer_per_hour>()
}

#[inline]
pub fn rpm_to_rad_s(v_rpm: f64) -> f64 {
    use uom::si::angular_velocity::radian_per_second;
    rpm(v_rpm).get::<radian_per_second>()
}

#[inline]
pub fn rad_s_to_rpm(v_rad_s: f64) -> f64 {
    use uom::si::angular_velocity::{radian_per_second, revolution_per_minute};
    AngularVelocity::new::<radian_per_second>(v_rad_s).get::<revolution_per_minute>()
}

/// Revolutions per minute of a wheel of radius `wheel_radius_m` rolling at `speed_mps`.
#[inline]
pub fn wheel_rpm(speed_mps: f64, wheel_radius_m: f64) -> f64 {
    rad_s_to_rpm(speed_mps / wheel_radius_m)
}

pub mod constants {
    /// Thermal coefficient of copper resistance, referenced to 0 °C (K).
    pub const COPPER_INFERRED_ZERO_K: f64 = 235.0;
    /// Reference temperature for winding resistances (°C).
    pub const REFERENCE_TEMPERATURE_C: f64 = 20.0;
    pub const ZERO_CELSIUS_K: f64 = 273.15;
}
