//! State shared by every motor variant.

use crate::error::{MotorError, MotorResult};
use crate::thermal::ThermalModel;
use tr_core::{AxleId, sign};

/// Mechanical bookkeeping and thermal state common to all motors.
#[derive(Debug, Clone, PartialEq)]
pub struct MotorCommon {
    inertia_kgm2: f64,
    friction_torque_nm: f64,
    transmission_ratio: f64,
    axle_diameter_m: f64,
    axle: Option<AxleId>,
    /// Electromagnetic torque from the last update (N·m)
    pub developed_torque_nm: f64,
    /// Rotor speed seen at the last update (rad/s)
    pub motor_speed_rad_s: f64,
    /// Winding losses from the last update (W)
    pub power_losses_w: f64,
    pub thermal: ThermalModel,
}

impl MotorCommon {
    pub fn new(inertia_kgm2: f64, friction_torque_nm: f64, thermal: ThermalModel) -> MotorResult<Self> {
        let mut common = Self {
            inertia_kgm2: 1.0,
            friction_torque_nm: 0.0,
            transmission_ratio: 1.0,
            axle_diameter_m: 1.0,
            axle: None,
            developed_torque_nm: 0.0,
            motor_speed_rad_s: 0.0,
            power_losses_w: 0.0,
            thermal,
        };
        common.set_inertia_kgm2(inertia_kgm2)?;
        common.set_friction_torque_nm(friction_torque_nm);
        Ok(common)
    }

    pub fn inertia_kgm2(&self) -> f64 {
        self.inertia_kgm2
    }

    pub fn set_inertia_kgm2(&mut self, value: f64) -> MotorResult<()> {
        if !(value > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "motor inertia must be greater than zero",
            });
        }
        self.inertia_kgm2 = value;
        Ok(())
    }

    pub fn friction_torque_nm(&self) -> f64 {
        self.friction_torque_nm
    }

    /// Stored as a magnitude; direction always opposes rotation.
    pub fn set_friction_torque_nm(&mut self, value: f64) {
        self.friction_torque_nm = value.abs();
    }

    pub fn transmission_ratio(&self) -> f64 {
        self.transmission_ratio
    }

    pub fn set_transmission_ratio(&mut self, value: f64) -> MotorResult<()> {
        if !(value > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "transmission ratio must be greater than zero",
            });
        }
        self.transmission_ratio = value;
        Ok(())
    }

    pub fn axle_diameter_m(&self) -> f64 {
        self.axle_diameter_m
    }

    pub fn set_axle_diameter_m(&mut self, value: f64) -> MotorResult<()> {
        if !(value > 0.0) {
            return Err(MotorError::InvalidArg {
                what: "axle diameter must be greater than zero",
            });
        }
        self.axle_diameter_m = value;
        Ok(())
    }

    pub fn wheel_radius_m(&self) -> f64 {
        0.5 * self.axle_diameter_m
    }

    /// Record the pairing with an axle and adopt its transmission geometry.
    pub fn connect(
        &mut self,
        axle: AxleId,
        transmission_ratio: f64,
        axle_diameter_m: f64,
    ) -> MotorResult<()> {
        self.set_transmission_ratio(transmission_ratio)?;
        self.set_axle_diameter_m(axle_diameter_m)?;
        self.axle = Some(axle);
        Ok(())
    }

    pub fn axle(&self) -> Option<AxleId> {
        self.axle
    }

    /// Rotor speed (rad/s) for a wheel surface speed (m/s).
    pub fn motor_speed_from_axle(&self, axle_speed_mps: f64) -> f64 {
        axle_speed_mps * self.transmission_ratio / self.wheel_radius_m()
    }

    pub fn apply_friction(&self, torque_nm: f64, motor_speed_rad_s: f64) -> f64 {
        torque_nm - sign(motor_speed_rad_s) * self.friction_torque_nm
    }

    pub fn update_thermal(&mut self, dt: f64) {
        self.thermal.update(dt, self.power_losses_w);
    }
}
