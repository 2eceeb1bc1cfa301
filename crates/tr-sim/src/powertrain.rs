//! One driven wheelset with its drive source, stepped in a fixed order.

use crate::engine::Engine;
use crate::error::{SimError, SimResult};
use crate::schedule::Controls;
use tr_axle::{Axle, AxleDrive};
use tr_core::IdAllocator;
use tr_gearbox::{GearBox, GearBoxEvent};
use tr_motor::{InductionMotor, MotorKind, SeriesMotor};
use tr_project::{DriveDef, GearCommandDef, VehicleDef};
use tracing::debug;

/// Drive source and how throttle maps onto it.
#[derive(Clone, Debug)]
pub enum Traction {
    NotDriven,
    Force { max_force_n: f64 },
    SeriesMotor { max_voltage_v: f64 },
    InductionMotor { max_force_n: f64 },
    GearBox { gearbox: Box<GearBox>, engine: Engine },
}

/// Axle plus drive, with optional point-mass train dynamics.
///
/// Each tick runs, in order:
/// 1. gearbox update against the previous tick's axle speed,
/// 2. drive command onto the axle (gearbox tractive force, motor set point or force),
/// 3. `Axle::update`, which updates any motor before integrating,
/// 4. train speed from the axle force, when a train mass is set.
#[derive(Clone, Debug)]
pub struct Powertrain {
    axle: Axle,
    traction: Traction,
    train_mass_kg: Option<f64>,
    time_s: f64,
}

impl Powertrain {
    pub fn new(axle: Axle, traction: Traction, train_mass_kg: Option<f64>) -> Self {
        Self {
            axle,
            traction,
            train_mass_kg,
            time_s: 0.0,
        }
    }

    /// Build the powertrain a vehicle file describes, at its initial speed.
    pub fn from_vehicle(vehicle: &VehicleDef) -> SimResult<Self> {
        let mut ids = IdAllocator::new();
        let (drive, traction) = match &vehicle.drive {
            DriveDef::NotDriven => (AxleDrive::NotDriven, Traction::NotDriven),
            DriveDef::Force { max_force_n } => (
                AxleDrive::Force,
                Traction::Force {
                    max_force_n: *max_force_n,
                },
            ),
            DriveDef::SeriesMotor { motor, max_voltage_v } => (
                AxleDrive::Motor(MotorKind::from(SeriesMotor::new(motor.clone())?)),
                Traction::SeriesMotor {
                    max_voltage_v: *max_voltage_v,
                },
            ),
            DriveDef::InductionMotor { motor, max_force_n } => (
                AxleDrive::Motor(MotorKind::from(InductionMotor::new(motor.clone())?)),
                Traction::InductionMotor {
                    max_force_n: *max_force_n,
                },
            ),
            DriveDef::GearBox {
                gearbox,
                engine,
                initial_gear,
                engine_rpm_rate_per_s,
            } => {
                let mut gb = GearBox::new(gearbox.clone(), engine.clone(), vehicle.axle.wheel_radius_m)?;
                if let Some(gear) = initial_gear {
                    gb.set_current_gear_index(*gear);
                    gb.set_next_gear_index(*gear);
                }
                (
                    AxleDrive::Force,
                    Traction::GearBox {
                        gearbox: Box::new(gb),
                        engine: Engine::new(engine.clone(), *engine_rpm_rate_per_s),
                    },
                )
            }
        };
        let mut axle = Axle::new(ids.next_id(), &vehicle.axle, drive)?;
        axle.reset_to_speed(vehicle.scenario.initial_speed_mps);
        Ok(Self::new(axle, traction, vehicle.scenario.train_mass_kg))
    }

    pub fn axle(&self) -> &Axle {
        &self.axle
    }

    pub fn axle_mut(&mut self) -> &mut Axle {
        &mut self.axle
    }

    pub fn traction(&self) -> &Traction {
        &self.traction
    }

    pub fn gearbox(&self) -> Option<&GearBox> {
        match &self.traction {
            Traction::GearBox { gearbox, .. } => Some(&**gearbox),
            _ => None,
        }
    }

    pub fn engine(&self) -> Option<&Engine> {
        match &self.traction {
            Traction::GearBox { engine, .. } => Some(engine),
            _ => None,
        }
    }

    pub fn train_mass_kg(&self) -> Option<f64> {
        self.train_mass_kg
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub(crate) fn traction_mut(&mut self) -> &mut Traction {
        &mut self.traction
    }

    pub(crate) fn set_time_s(&mut self, time_s: f64) {
        self.time_s = time_s;
    }

    /// Pass an operator gear request to the gearbox.
    pub fn gear_command(&mut self, command: GearCommandDef) -> SimResult<()> {
        let Traction::GearBox { gearbox, .. } = &mut self.traction else {
            return Err(SimError::InvalidArg {
                what: "gear command on a drive without gearbox",
            });
        };
        match command {
            GearCommandDef::Up => gearbox.manual_gear_up(),
            GearCommandDef::Down => gearbox.manual_gear_down(),
        }
        debug!(?command, next = gearbox.next_gear_index(), "gear selected");
        Ok(())
    }

    /// Advance one tick; returns gearbox events raised during it.
    pub fn step(&mut self, dt: f64, controls: Controls) -> Vec<GearBoxEvent> {
        if dt <= 0.0 {
            return Vec::new();
        }
        let throttle = controls.throttle.clamp(0.0, 1.0);
        self.axle.brake_retard_force_n = controls.brake_force_n.abs();

        let mut events = Vec::new();
        match &mut self.traction {
            Traction::NotDriven => {}
            Traction::Force { max_force_n } => {
                self.axle.drive_force_n = throttle * *max_force_n;
            }
            Traction::SeriesMotor { max_voltage_v } => {
                if let Some(MotorKind::Series(m)) = self.axle.motor_mut() {
                    m.set_terminal_voltage_v(throttle * *max_voltage_v);
                }
            }
            Traction::InductionMotor { max_force_n } => {
                if let Some(MotorKind::Induction(m)) = self.axle.motor_mut() {
                    m.target_force_n = throttle * *max_force_n;
                }
            }
            Traction::GearBox { gearbox, engine } => {
                let inputs = engine.inputs(throttle, self.axle.axle_speed_mps());
                gearbox.update(dt, &inputs);
                self.axle.drive_force_n = gearbox.tractive_force_n(&inputs);
                engine.update(dt, throttle, gearbox);
                events = gearbox.drain_events();
            }
        }

        self.axle.update(dt);

        if let Some(mass) = self.train_mass_kg {
            self.axle.train_speed_mps += self.axle.axle_force_n() / mass * dt;
        }
        self.time_s += dt;
        events
    }
}
