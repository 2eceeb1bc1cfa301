//! Vehicle validation logic.

use crate::schema::{ControlPointDef, DriveDef, ScenarioDef, VehicleDef};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate value: {value} in {context}")]
    Duplicate { value: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: impl ToString) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_vehicle(vehicle: &VehicleDef) -> Result<(), ValidationError> {
    if vehicle.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: vehicle.version,
        });
    }
    if vehicle.name.trim().is_empty() {
        return Err(invalid("name", "\"\"", "vehicle name must not be empty"));
    }

    vehicle
        .axle
        .validate()
        .map_err(|e| invalid("axle", "..", e))?;

    validate_drive(&vehicle.drive)?;
    validate_scenario(&vehicle.scenario, &vehicle.drive)?;
    Ok(())
}

fn validate_drive(drive: &DriveDef) -> Result<(), ValidationError> {
    match drive {
        DriveDef::NotDriven => {}
        DriveDef::Force { max_force_n } => {
            if !(max_force_n.is_finite() && *max_force_n >= 0.0) {
                return Err(invalid("drive.max_force_n", max_force_n, "must be finite and non-negative"));
            }
        }
        DriveDef::SeriesMotor { motor, max_voltage_v } => {
            motor.validate().map_err(|e| invalid("drive.motor", "..", e))?;
            if !(max_voltage_v.is_finite() && *max_voltage_v > 0.0) {
                return Err(invalid("drive.max_voltage_v", max_voltage_v, "must be positive"));
            }
        }
        DriveDef::InductionMotor { motor, max_force_n } => {
            motor.validate().map_err(|e| invalid("drive.motor", "..", e))?;
            if !(max_force_n.is_finite() && *max_force_n >= 0.0) {
                return Err(invalid("drive.max_force_n", max_force_n, "must be finite and non-negative"));
            }
        }
        DriveDef::GearBox {
            gearbox,
            engine,
            initial_gear,
            engine_rpm_rate_per_s,
        } => {
            gearbox.validate().map_err(|e| invalid("drive.gearbox", "..", e))?;
            engine.validate().map_err(|e| invalid("drive.engine", "..", e))?;
            if let Some(gear) = initial_gear {
                let top = gearbox.num_of_gears() as i32 - 1;
                if !(-1..=top).contains(gear) {
                    return Err(invalid(
                        "drive.initial_gear",
                        gear,
                        format!("must lie in [-1, {top}]"),
                    ));
                }
            }
            if !(*engine_rpm_rate_per_s > 0.0) {
                return Err(invalid(
                    "drive.engine_rpm_rate_per_s",
                    engine_rpm_rate_per_s,
                    "must be positive",
                ));
            }
        }
    }
    Ok(())
}

fn validate_scenario(scenario: &ScenarioDef, drive: &DriveDef) -> Result<(), ValidationError> {
    if !(scenario.dt_s > 0.0 && scenario.dt_s.is_finite()) {
        return Err(invalid("scenario.dt_s", scenario.dt_s, "must be positive"));
    }
    if !(scenario.t_end_s >= 0.0 && scenario.t_end_s.is_finite()) {
        return Err(invalid("scenario.t_end_s", scenario.t_end_s, "must be non-negative"));
    }
    if scenario.record_every == 0 {
        return Err(invalid("scenario.record_every", 0, "must be at least 1"));
    }
    if !scenario.initial_speed_mps.is_finite() {
        return Err(invalid(
            "scenario.initial_speed_mps",
            scenario.initial_speed_mps,
            "must be finite",
        ));
    }
    if let Some(mass) = scenario.train_mass_kg {
        if !(mass > 0.0) {
            return Err(invalid("scenario.train_mass_kg", mass, "must be positive"));
        }
    }

    let mut last_time: Option<f64> = None;
    for point in &scenario.controls {
        validate_control_point(point, drive)?;
        if let Some(last) = last_time {
            if point.time_s == last {
                return Err(ValidationError::Duplicate {
                    value: point.time_s.to_string(),
                    context: "scenario.controls time_s".to_string(),
                });
            }
            if point.time_s < last {
                return Err(invalid(
                    "scenario.controls.time_s",
                    point.time_s,
                    "control points must be in time order",
                ));
            }
        }
        last_time = Some(point.time_s);
    }
    Ok(())
}

fn validate_control_point(point: &ControlPointDef, drive: &DriveDef) -> Result<(), ValidationError> {
    if !(point.time_s >= 0.0 && point.time_s.is_finite()) {
        return Err(invalid("scenario.controls.time_s", point.time_s, "must be non-negative"));
    }
    if !(0.0..=1.0).contains(&point.throttle) {
        return Err(invalid("scenario.controls.throttle", point.throttle, "must lie in [0, 1]"));
    }
    if !(point.brake_force_n >= 0.0 && point.brake_force_n.is_finite()) {
        return Err(invalid(
            "scenario.controls.brake_force_n",
            point.brake_force_n,
            "must be non-negative",
        ));
    }
    if point.gear.is_some() && !matches!(drive, DriveDef::GearBox { .. }) {
        return Err(ValidationError::Unsupported {
            feature: "gear command".to_string(),
            reason: format!("drive {} has no gearbox", drive.kind_name()),
        });
    }
    Ok(())
}
