//! Wheelset rotational dynamics.

use crate::adhesion::{peak_slip_speed_mps, slip_characteristics, slip_characteristics_inverse};
use crate::error::{AxleError, AxleResult};
use crate::integrator::SubstepController;
use crate::params::{AxleParams, check_efficiency, check_positive};
use crate::slip::DwellDetector;
use serde::{Deserialize, Serialize};
use tr_core::{AxleId, finite_or_zero, sign, wrap_angle};
use tr_motor::{AxleKinematics, ElectricMotor, MotorKind, MotorSaveState};
use tracing::{debug, warn};

const WARNING_THRESHOLD_FRACTION: f64 = 0.75;
/// Slip, as a fraction of the wheel-slip threshold, below which the
/// stationary approximation may be used.
const STATIONARY_SLIP_FRACTION: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxleDriveType {
    NotDriven,
    MotorDriven,
    ForceDriven,
}

/// Source of the drive input acting on the wheelset.
#[derive(Debug, Clone, PartialEq)]
pub enum AxleDrive {
    NotDriven,
    /// `Axle::drive_force_n` is applied through the transmission efficiency.
    Force,
    Motor(MotorKind),
}

impl AxleDrive {
    pub fn drive_type(&self) -> AxleDriveType {
        match self {
            AxleDrive::NotDriven => AxleDriveType::NotDriven,
            AxleDrive::Force => AxleDriveType::ForceDriven,
            AxleDrive::Motor(_) => AxleDriveType::MotorDriven,
        }
    }
}

/// Result of evaluating the axle equation of motion at one speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionVariation {
    /// dv/dt of the wheel surface speed (m/s²)
    pub acceleration_mps2: f64,
    pub angular_velocity_rad_s: f64,
    /// Adhesion-limited force from the rail on the wheel (N)
    pub rail_reaction_n: f64,
    /// Drive force at the rail before adhesion (N)
    pub drive_input_n: f64,
}

/// All mutable axle state, enough to reproduce subsequent behaviour exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxleSaveState {
    pub previous_slip_percent: f64,
    pub previous_slip_speed_mps: f64,
    pub axle_force_n: f64,
    pub compensated_axle_force_n: f64,
    pub axle_speed_mps: f64,
    pub axle_position_rad: f64,
    pub train_speed_mps: f64,
    pub drive_force_n: f64,
    pub slip_derivation_mps2: f64,
    pub slip_derivation_percent_ps: f64,
    pub integrator_error: f64,
    pub substeps: SubstepController,
    pub wheel_slip: DwellDetector,
    pub wheel_slip_warning: DwellDetector,
    #[serde(default)]
    pub motor: Option<MotorSaveState>,
}

/// One powered or braked wheelset.
///
/// Net force at the rail:
///
/// ```text
/// F = F_drive − F_rail(slip) − D·slip − sign(v)·(F_brake + F_friction)
/// dv/dt = F · r² / I_total,   I_total = I + I_motor · ratio²
/// ```
///
/// `F_rail = W · slip_characteristics(slip)` is the adhesion-limited reaction.
/// Speeds are wheel surface speeds in m/s, signed by direction of travel.
#[derive(Debug, Clone, PartialEq)]
pub struct Axle {
    id: AxleId,
    drive: AxleDrive,

    inertia_kgm2: f64,
    transmission_ratio: f64,
    transmission_efficiency: f64,
    wheel_radius_m: f64,
    adhesion_limit: f64,
    adhesion_k: f64,
    slip_warning_threshold_percent: f64,

    /// Commanded force for force-driven axles; averaged drive input for motor-driven ones (N)
    pub drive_force_n: f64,
    /// Brake effort at the rail (N), applied as a magnitude
    pub brake_retard_force_n: f64,
    pub friction_n: f64,
    /// Slip damping (N·s/m)
    pub damping_ns: f64,
    pub axle_weight_n: f64,
    /// Vehicle speed over ground, driven by the train model (m/s)
    pub train_speed_mps: f64,

    axle_speed_mps: f64,
    axle_position_rad: f64,
    axle_force_n: f64,
    compensated_axle_force_n: f64,

    substeps: SubstepController,
    integrator_error: f64,

    previous_slip_speed_mps: f64,
    previous_slip_percent: f64,
    slip_derivation_mps2: f64,
    slip_derivation_percent_ps: f64,
    wheel_slip: DwellDetector,
    wheel_slip_warning: DwellDetector,
}

impl Axle {
    pub fn new(id: AxleId, params: &AxleParams, drive: AxleDrive) -> AxleResult<Self> {
        params.validate()?;
        let mut axle = Self {
            id,
            drive: AxleDrive::NotDriven,
            inertia_kgm2: params.inertia_kgm2,
            transmission_ratio: params.transmission_ratio,
            transmission_efficiency: check_efficiency(params.transmission_efficiency)?,
            wheel_radius_m: params.wheel_radius_m,
            adhesion_limit: params.adhesion_limit,
            adhesion_k: params.adhesion_k,
            slip_warning_threshold_percent: params.slip_warning_threshold_percent,
            drive_force_n: 0.0,
            brake_retard_force_n: 0.0,
            friction_n: params.friction_n,
            damping_ns: params.damping_ns,
            axle_weight_n: params.axle_weight_n,
            train_speed_mps: 0.0,
            axle_speed_mps: 0.0,
            axle_position_rad: 0.0,
            axle_force_n: 0.0,
            compensated_axle_force_n: 0.0,
            substeps: SubstepController::default(),
            integrator_error: 0.0,
            previous_slip_speed_mps: 0.0,
            previous_slip_percent: 0.0,
            slip_derivation_mps2: 0.0,
            slip_derivation_percent_ps: 0.0,
            wheel_slip: DwellDetector::default(),
            wheel_slip_warning: DwellDetector::default(),
        };
        axle.set_drive(drive)?;
        Ok(axle)
    }

    pub fn id(&self) -> AxleId {
        self.id
    }

    pub fn drive(&self) -> &AxleDrive {
        &self.drive
    }

    pub fn drive_type(&self) -> AxleDriveType {
        self.drive.drive_type()
    }

    /// Switch drive source. A motor is connected to this axle's geometry.
    pub fn set_drive(&mut self, mut drive: AxleDrive) -> AxleResult<()> {
        if let AxleDrive::Motor(motor) = &mut drive {
            motor
                .common_mut()
                .connect(self.id, self.transmission_ratio, 2.0 * self.wheel_radius_m)?;
        }
        self.drive = drive;
        Ok(())
    }

    pub fn motor(&self) -> Option<&MotorKind> {
        match &self.drive {
            AxleDrive::Motor(m) => Some(m),
            _ => None,
        }
    }

    pub fn motor_mut(&mut self) -> Option<&mut MotorKind> {
        match &mut self.drive {
            AxleDrive::Motor(m) => Some(m),
            _ => None,
        }
    }

    // --- configuration ---

    pub fn inertia_kgm2(&self) -> f64 {
        self.inertia_kgm2
    }

    pub fn set_inertia_kgm2(&mut self, value: f64) -> AxleResult<()> {
        self.inertia_kgm2 = check_positive(value, "axle inertia must be greater than zero")?;
        Ok(())
    }

    /// Wheelset inertia plus the motor rotor reflected through the transmission.
    pub fn inertia_total_kgm2(&self) -> f64 {
        match &self.drive {
            AxleDrive::Motor(m) => {
                self.inertia_kgm2 + m.inertia_kgm2() * self.transmission_ratio * self.transmission_ratio
            }
            _ => self.inertia_kgm2,
        }
    }

    pub fn transmission_ratio(&self) -> f64 {
        self.transmission_ratio
    }

    pub fn set_transmission_ratio(&mut self, value: f64) -> AxleResult<()> {
        let value = check_positive(value, "transmission ratio must be greater than zero")?;
        if let AxleDrive::Motor(m) = &mut self.drive {
            m.common_mut().set_transmission_ratio(value)?;
        }
        self.transmission_ratio = value;
        Ok(())
    }

    pub fn transmission_efficiency(&self) -> f64 {
        self.transmission_efficiency
    }

    /// Accepts (0, 1]; zero is replaced by 0.99.
    pub fn set_transmission_efficiency(&mut self, value: f64) -> AxleResult<()> {
        self.transmission_efficiency = check_efficiency(value)?;
        Ok(())
    }

    pub fn wheel_radius_m(&self) -> f64 {
        self.wheel_radius_m
    }

    pub fn set_wheel_radius_m(&mut self, value: f64) -> AxleResult<()> {
        let value = check_positive(value, "wheel radius must be greater than zero")?;
        if let AxleDrive::Motor(m) = &mut self.drive {
            m.common_mut().set_axle_diameter_m(2.0 * value)?;
        }
        self.wheel_radius_m = value;
        Ok(())
    }

    pub fn adhesion_limit(&self) -> f64 {
        self.adhesion_limit
    }

    pub fn set_adhesion_limit(&mut self, value: f64) -> AxleResult<()> {
        self.adhesion_limit = check_positive(value, "adhesion limit must be greater than zero")?;
        Ok(())
    }

    pub fn adhesion_k(&self) -> f64 {
        self.adhesion_k
    }

    pub fn set_adhesion_k(&mut self, value: f64) -> AxleResult<()> {
        self.adhesion_k = check_positive(value, "adhesion K must be greater than zero")?;
        Ok(())
    }

    pub fn slip_warning_threshold_percent(&self) -> f64 {
        self.slip_warning_threshold_percent
    }

    pub fn set_slip_warning_threshold_percent(&mut self, value: f64) {
        self.slip_warning_threshold_percent = value;
    }

    // --- state and derived quantities ---

    pub fn axle_speed_mps(&self) -> f64 {
        self.axle_speed_mps
    }

    /// Position of the wheel in its revolution, in [−π, π).
    pub fn axle_position_rad(&self) -> f64 {
        self.axle_position_rad
    }

    /// Rail force averaged over the last integration (N).
    pub fn axle_force_n(&self) -> f64 {
        self.axle_force_n
    }

    /// Axle force with the brake contribution folded back in, for the train force balance.
    pub fn compensated_axle_force_n(&self) -> f64 {
        self.compensated_axle_force_n
    }

    pub fn slip_speed_mps(&self) -> f64 {
        self.axle_speed_mps - self.train_speed_mps
    }

    /// Slip speed as a percentage of the wheel-slip threshold; zero if undefined.
    pub fn slip_speed_percent(&self) -> f64 {
        finite_or_zero(100.0 * self.slip_speed_mps() / self.wheel_slip_threshold_mps())
    }

    pub fn wheel_slip_threshold_mps(&self) -> f64 {
        peak_slip_speed_mps(self.adhesion_k, self.adhesion_limit)
    }

    pub fn wheel_slip_warning_threshold_mps(&self) -> f64 {
        WARNING_THRESHOLD_FRACTION * self.wheel_slip_threshold_mps()
    }

    pub fn slip_derivation_mps2(&self) -> f64 {
        self.slip_derivation_mps2
    }

    pub fn slip_derivation_percent_ps(&self) -> f64 {
        self.slip_derivation_percent_ps
    }

    pub fn is_wheel_slip(&self) -> bool {
        self.wheel_slip.is_active()
    }

    pub fn is_wheel_slip_warning(&self) -> bool {
        self.wheel_slip_warning.is_active()
    }

    pub fn num_of_substeps(&self) -> u32 {
        self.substeps.substeps()
    }

    pub fn integrator_error(&self) -> f64 {
        self.integrator_error
    }

    pub fn kinematics(&self) -> AxleKinematics {
        AxleKinematics {
            axle: self.id,
            axle_speed_mps: self.axle_speed_mps,
            train_speed_mps: self.train_speed_mps,
            wheel_slip_threshold_mps: self.wheel_slip_threshold_mps(),
        }
    }

    // --- dynamics ---

    fn dissipative_force_n(&self) -> f64 {
        self.brake_retard_force_n.abs() + self.friction_n.abs()
    }

    /// Drive force at the rail for a hypothetical axle speed (N).
    fn drive_input_n(&self, axle_speed_mps: f64) -> f64 {
        match &self.drive {
            AxleDrive::NotDriven => 0.0,
            AxleDrive::Force => self.drive_force_n * self.transmission_efficiency,
            AxleDrive::Motor(m) => {
                let omega = m.common().motor_speed_from_axle(axle_speed_mps);
                m.developed_torque_nm(omega) * self.transmission_efficiency * self.transmission_ratio
                    / self.wheel_radius_m
            }
        }
    }

    /// Evaluate the equation of motion at `axle_speed_mps` without touching state.
    pub fn get_axle_motion_variation(&self, axle_speed_mps: f64) -> MotionVariation {
        let slip = axle_speed_mps - self.train_speed_mps;
        let rail_reaction_n = self.axle_weight_n
            * slip_characteristics(slip, self.train_speed_mps, self.adhesion_k, self.adhesion_limit);
        let drive_input_n = self.drive_input_n(axle_speed_mps);
        let net = drive_input_n
            - rail_reaction_n
            - self.damping_ns * slip
            - sign(axle_speed_mps) * self.dissipative_force_n();
        let r = self.wheel_radius_m;
        MotionVariation {
            acceleration_mps2: net * r * r / self.inertia_total_kgm2(),
            angular_velocity_rad_s: axle_speed_mps / r,
            rail_reaction_n,
            drive_input_n,
        }
    }

    /// Advance speed and position with adaptive-substep RK4.
    pub fn integrate(&mut self, elapsed_s: f64) {
        if elapsed_s <= 0.0 {
            return;
        }
        let slip = self.slip_speed_mps();
        self.substeps.adapt(self.integrator_error, slip);
        let mut n = self.substeps.substeps();
        let mut h = elapsed_s / n as f64;

        let mut force_sum = 0.0;
        let mut drive_sum = 0.0;
        let mut i = 0;
        while i < n {
            let v = self.axle_speed_mps;
            let k1 = self.get_axle_motion_variation(v);
            if i == 0 {
                if SubstepController::is_steep(k1.acceleration_mps2 * h, slip) {
                    self.substeps.boost();
                    n = self.substeps.substeps();
                    h = elapsed_s / n as f64;
                }
                if sign(v + k1.acceleration_mps2 * h) != sign(v)
                    && self.dissipative_force_n() > (k1.drive_input_n - k1.rail_reaction_n).abs()
                {
                    self.axle_position_rad =
                        wrap_angle(self.axle_position_rad + k1.angular_velocity_rad_s * 0.5 * h);
                    self.axle_speed_mps = 0.0;
                    self.axle_force_n = k1.rail_reaction_n;
                    if let AxleDrive::Motor(_) = self.drive {
                        self.drive_force_n = k1.drive_input_n;
                    }
                    debug!(axle = %self.id, "axle held by stiction");
                    return;
                }
            }
            let k2 = self.get_axle_motion_variation(v + k1.acceleration_mps2 * 0.5 * h);
            let k3 = self.get_axle_motion_variation(v + k2.acceleration_mps2 * 0.5 * h);
            let k4 = self.get_axle_motion_variation(v + k3.acceleration_mps2 * h);

            let dvdt = (k1.acceleration_mps2
                + 2.0 * k2.acceleration_mps2
                + 2.0 * k3.acceleration_mps2
                + k4.acceleration_mps2)
                / 6.0;
            let dxdt = (k1.angular_velocity_rad_s
                + 2.0 * k2.angular_velocity_rad_s
                + 2.0 * k3.angular_velocity_rad_s
                + k4.angular_velocity_rad_s)
                / 6.0;
            force_sum += (k1.rail_reaction_n
                + 2.0 * k2.rail_reaction_n
                + 2.0 * k3.rail_reaction_n
                + k4.rail_reaction_n)
                / 6.0;
            drive_sum += (k1.drive_input_n
                + 2.0 * k2.drive_input_n
                + 2.0 * k3.drive_input_n
                + k4.drive_input_n)
                / 6.0;

            self.integrator_error = dvdt * h;
            self.axle_speed_mps = v + dvdt * h;
            self.axle_position_rad = wrap_angle(self.axle_position_rad + dxdt * h);
            i += 1;
        }
        self.axle_force_n = force_sum / n as f64;
        if let AxleDrive::Motor(_) = self.drive {
            self.drive_force_n = drive_sum / n as f64;
        }
    }

    /// Quasi-static solution for low slip.
    ///
    /// When the force the axle must transmit is within adhesion and slip is
    /// well below the threshold, the slip follows directly from the inverse
    /// adhesion curve. Otherwise this falls through to [`Axle::integrate`].
    ///
    /// [`Axle::update`] always integrates. This is a cheaper alternative a
    /// caller may step with instead, and a reference for the integrated
    /// steady state at low slip.
    pub fn stationary_calculation(&mut self, elapsed_s: f64) {
        if elapsed_s <= 0.0 {
            return;
        }
        let max_adhesion_n = self.axle_weight_n * self.adhesion_limit;
        let small_slip = self.slip_speed_mps().abs()
            < STATIONARY_SLIP_FRACTION * self.wheel_slip_threshold_mps();
        if max_adhesion_n > 0.0 && small_slip {
            let drive_n = self.drive_input_n(self.train_speed_mps);
            let required_n = drive_n - sign(self.axle_speed_mps) * self.dissipative_force_n();
            let ratio = required_n / max_adhesion_n;
            if ratio.abs() <= 1.0 {
                let slip = slip_characteristics_inverse(ratio, self.adhesion_k, self.adhesion_limit);
                self.axle_speed_mps = self.train_speed_mps + slip;
                self.axle_force_n = required_n;
                if let AxleDrive::Motor(_) = self.drive {
                    self.drive_force_n = drive_n;
                }
                self.axle_position_rad = wrap_angle(
                    self.axle_position_rad + self.axle_speed_mps / self.wheel_radius_m * elapsed_s,
                );
                return;
            }
        }
        self.integrate(elapsed_s);
    }

    /// One simulation tick: motor first, then the axle, then slip monitoring.
    pub fn update(&mut self, elapsed_s: f64) {
        if elapsed_s <= 0.0 {
            return;
        }
        let kinematics = self.kinematics();
        if let AxleDrive::Motor(m) = &mut self.drive {
            m.update(elapsed_s, &kinematics);
        }

        self.integrate(elapsed_s);

        self.compensated_axle_force_n = if self.axle_force_n == 0.0 {
            0.0
        } else {
            self.axle_force_n + sign(self.train_speed_mps) * self.brake_retard_force_n.abs()
        };

        let slip = self.slip_speed_mps();
        let slip_percent = self.slip_speed_percent();
        self.slip_derivation_mps2 = (slip - self.previous_slip_speed_mps) / elapsed_s;
        self.slip_derivation_percent_ps = (slip_percent - self.previous_slip_percent) / elapsed_s;
        self.previous_slip_speed_mps = slip;
        self.previous_slip_percent = slip_percent;

        let threshold = self.wheel_slip_threshold_mps();
        if self.wheel_slip.update(slip.abs() > threshold, elapsed_s) {
            warn!(axle = %self.id, slip_speed_mps = slip, threshold, "wheel slip");
        }
        let warning = slip_percent.abs() > self.slip_warning_threshold_percent;
        if self.wheel_slip_warning.update(warning, elapsed_s) {
            debug!(axle = %self.id, slip_percent, "wheel slip warning");
        }
    }

    /// Cold start: everything at rest.
    pub fn reset(&mut self) {
        self.axle_speed_mps = 0.0;
        self.axle_position_rad = 0.0;
        self.axle_force_n = 0.0;
        self.compensated_axle_force_n = 0.0;
        self.substeps = SubstepController::default();
        self.integrator_error = 0.0;
        self.previous_slip_speed_mps = 0.0;
        self.previous_slip_percent = 0.0;
        self.slip_derivation_mps2 = 0.0;
        self.slip_derivation_percent_ps = 0.0;
        self.wheel_slip.reset();
        self.wheel_slip_warning.reset();
        if let AxleDrive::Motor(m) = &mut self.drive {
            m.reset();
        }
    }

    /// Moving start: rolling without slip at `speed_mps`.
    pub fn reset_to_speed(&mut self, speed_mps: f64) {
        self.reset();
        self.train_speed_mps = speed_mps;
        self.axle_speed_mps = speed_mps;
    }

    // --- persistence ---

    pub fn save_state(&self) -> AxleSaveState {
        AxleSaveState {
            previous_slip_percent: self.previous_slip_percent,
            previous_slip_speed_mps: self.previous_slip_speed_mps,
            axle_force_n: self.axle_force_n,
            compensated_axle_force_n: self.compensated_axle_force_n,
            axle_speed_mps: self.axle_speed_mps,
            axle_position_rad: self.axle_position_rad,
            train_speed_mps: self.train_speed_mps,
            drive_force_n: self.drive_force_n,
            slip_derivation_mps2: self.slip_derivation_mps2,
            slip_derivation_percent_ps: self.slip_derivation_percent_ps,
            integrator_error: self.integrator_error,
            substeps: self.substeps,
            wheel_slip: self.wheel_slip,
            wheel_slip_warning: self.wheel_slip_warning,
            motor: self.motor().map(MotorKind::save_state),
        }
    }

    pub fn restore(&mut self, state: Option<&AxleSaveState>) -> AxleResult<()> {
        let state = state.ok_or(AxleError::MissingSaveState)?;
        match (&mut self.drive, &state.motor) {
            (AxleDrive::Motor(m), Some(ms)) => m.restore(ms)?,
            (AxleDrive::Motor(_), None) => {
                return Err(AxleError::Motor {
                    message: "save state has no motor state for a motor-driven axle".into(),
                });
            }
            (_, Some(_)) => {
                return Err(AxleError::Motor {
                    message: "save state has motor state but the axle has no motor".into(),
                });
            }
            (_, None) => {}
        }
        self.previous_slip_percent = state.previous_slip_percent;
        self.previous_slip_speed_mps = state.previous_slip_speed_mps;
        self.axle_force_n = state.axle_force_n;
        self.compensated_axle_force_n = state.compensated_axle_force_n;
        self.axle_speed_mps = state.axle_speed_mps;
        self.axle_position_rad = state.axle_position_rad;
        self.train_speed_mps = state.train_speed_mps;
        self.drive_force_n = state.drive_force_n;
        self.slip_derivation_mps2 = state.slip_derivation_mps2;
        self.slip_derivation_percent_ps = state.slip_derivation_percent_ps;
        self.integrator_error = state.integrator_error;
        self.substeps = state.substeps;
        self.wheel_slip = state.wheel_slip;
        self.wheel_slip_warning = state.wheel_slip_warning;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AxleParams {
        AxleParams {
            inertia_kgm2: 200.0,
            wheel_radius_m: 0.5,
            transmission_ratio: 1.0,
            transmission_efficiency: 1.0,
            adhesion_limit: 0.33,
            adhesion_k: 0.7,
            slip_warning_threshold_percent: 70.0,
            axle_weight_n: 100_000.0,
            friction_n: 0.0,
            damping_ns: 0.0,
        }
    }

    fn force_axle() -> Axle {
        Axle::new(AxleId::from_index(0), &params(), AxleDrive::Force).unwrap()
    }

    #[test]
    fn rejects_non_positive_inertia() {
        let mut a = force_axle();
        assert!(matches!(
            a.set_inertia_kgm2(0.0),
            Err(AxleError::InvalidConfig { .. })
        ));
        assert!(a.set_inertia_kgm2(-3.0).is_err());
        assert!(a.set_inertia_kgm2(12.5).is_ok());
        assert_eq!(a.inertia_kgm2(), 12.5);
    }

    #[test]
    fn efficiency_guard() {
        let mut a = force_axle();
        a.set_transmission_efficiency(0.0).unwrap();
        assert_eq!(a.transmission_efficiency(), 0.99);
        assert!(a.set_transmission_efficiency(1.5).is_err());
        assert!(a.set_transmission_ratio(0.0).is_err());
    }

    #[test]
    fn motion_variation_is_pure() {
        let mut a = force_axle();
        a.drive_force_n = 10_000.0;
        let before = a.clone();
        let mv = a.get_axle_motion_variation(0.2);
        assert_eq!(a, before);
        assert!(mv.rail_reaction_n > 0.0);
        assert_eq!(mv.drive_input_n, 10_000.0);
        assert!((mv.angular_velocity_rad_s - 0.4).abs() < 1e-12);
    }

    #[test]
    fn acceleration_uses_inertia_and_radius() {
        let mut a = force_axle();
        a.axle_weight_n = 0.0;
        a.drive_force_n = 800.0;
        let mv = a.get_axle_motion_variation(0.0);
        // 800 N · 0.25 m² / 200 kg·m²
        assert!((mv.acceleration_mps2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_step_is_noop() {
        let mut a = force_axle();
        a.drive_force_n = 20_000.0;
        a.update(0.01);
        let before = a.clone();
        a.integrate(0.0);
        a.update(0.0);
        a.update(-1.0);
        a.stationary_calculation(0.0);
        assert_eq!(a, before);
    }

    #[test]
    fn brake_holds_axle_at_rest() {
        let mut a = force_axle();
        a.drive_force_n = 1_000.0;
        a.brake_retard_force_n = 5_000.0;
        for _ in 0..20 {
            a.update(0.01);
        }
        assert_eq!(a.axle_speed_mps(), 0.0);
    }

    #[test]
    fn braking_brings_axle_to_rest() {
        let mut a = force_axle();
        a.axle_weight_n = 0.0;
        a.reset_to_speed(1.0);
        a.train_speed_mps = 0.0;
        a.brake_retard_force_n = 10_000.0;
        for _ in 0..200 {
            a.update(0.01);
            assert!(a.axle_speed_mps() <= 1.0);
        }
        assert!(a.axle_speed_mps().abs() < 0.05);
    }

    #[test]
    fn stationary_matches_required_force() {
        let mut a = force_axle();
        a.reset_to_speed(10.0);
        a.drive_force_n = 15_000.0;
        a.stationary_calculation(0.01);
        assert!((a.axle_force_n() - 15_000.0).abs() < 1e-9);
        assert!(a.slip_speed_mps() > 0.0);
        assert!(a.slip_speed_mps() < a.wheel_slip_threshold_mps());
        let mv = a.get_axle_motion_variation(a.axle_speed_mps());
        assert!((mv.rail_reaction_n - 15_000.0).abs() < 1e-6);
    }

    #[test]
    fn stationary_and_integrated_slip_agree_at_equilibrium() {
        let mut integrated = force_axle();
        integrated.reset_to_speed(10.0);
        integrated.drive_force_n = 15_000.0;
        let mut stationary = integrated.clone();

        for _ in 0..300 {
            integrated.update(0.01);
        }
        stationary.stationary_calculation(0.01);

        let diff = (integrated.slip_speed_mps() - stationary.slip_speed_mps()).abs();
        assert!(diff < 1e-3, "slip differs by {diff} m/s");
        assert!((integrated.axle_force_n() - stationary.axle_force_n()).abs() < 50.0);
    }

    #[test]
    fn stationary_falls_back_beyond_adhesion() {
        let mut a = force_axle();
        a.reset_to_speed(10.0);
        a.drive_force_n = 60_000.0;
        let mut b = a.clone();
        a.stationary_calculation(0.01);
        b.integrate(0.01);
        assert_eq!(a, b);
    }

    #[test]
    fn compensated_force_adds_brake_in_travel_direction() {
        let mut a = force_axle();
        a.reset_to_speed(5.0);
        a.brake_retard_force_n = 2_000.0;
        a.update(0.01);
        assert!(a.axle_force_n() < 0.0);
        assert!(
            (a.compensated_axle_force_n() - (a.axle_force_n() + 2_000.0)).abs() < 1e-9
        );
    }

    #[test]
    fn slip_percent_relative_to_threshold() {
        let mut a = force_axle();
        a.reset_to_speed(3.0);
        assert_eq!(a.slip_speed_percent(), 0.0);
        a.axle_speed_mps = 3.0 + a.wheel_slip_threshold_mps();
        assert!((a.slip_speed_percent() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn restore_rejects_missing_state() {
        let mut a = force_axle();
        assert_eq!(a.restore(None), Err(AxleError::MissingSaveState));
    }

    #[test]
    fn sustained_spin_raises_wheel_slip() {
        let mut a = force_axle();
        a.drive_force_n = 60_000.0;
        for _ in 0..300 {
            a.update(0.01);
        }
        assert!(a.is_wheel_slip());
        assert!(a.is_wheel_slip_warning());
        assert!(a.slip_speed_mps() > a.wheel_slip_threshold_mps());
    }
}
