use proptest::prelude::*;
use tr_axle::{Axle, AxleDrive, AxleParams, AxleSaveState};
use tr_core::AxleId;
use tr_motor::{ElectricMotor, MotorKind, SeriesMotor, SeriesMotorParams, ThermalParams};

fn params() -> AxleParams {
    AxleParams {
        inertia_kgm2: 200.0,
        wheel_radius_m: 0.5,
        transmission_ratio: 1.0,
        transmission_efficiency: 0.99,
        adhesion_limit: 0.33,
        adhesion_k: 0.7,
        slip_warning_threshold_percent: 70.0,
        axle_weight_n: 100_000.0,
        friction_n: 0.0,
        damping_ns: 0.0,
    }
}

fn series_motor() -> MotorKind {
    let mut m = SeriesMotor::new(SeriesMotorParams {
        nominal_current_a: 800.0,
        nominal_voltage_v: 1500.0,
        nominal_speed_rad_s: 150.0,
        armature_resistance_ohm: 0.05,
        armature_inductance_h: 0.0,
        field_resistance_ohm: 0.03,
        field_inductance_h: 0.02,
        shunt_resistor_ohm: 0.0,
        starting_resistor_ohm: 1.0,
        compensated: false,
        inertia_kgm2: 2.0,
        friction_torque_nm: 5.0,
        thermal: ThermalParams::default(),
    })
    .unwrap();
    m.set_terminal_voltage_v(400.0);
    MotorKind::Series(m)
}

#[test]
fn spinning_axle_stays_finite_and_slip_limited() {
    let mut axle = Axle::new(AxleId::from_index(0), &params(), AxleDrive::Force).unwrap();
    axle.train_speed_mps = 0.0;
    axle.drive_force_n = 50_000.0;

    let max_rail_force = 0.33 * 100_000.0;
    for _ in 0..1000 {
        axle.update(0.01);
        let v = axle.axle_speed_mps();
        assert!(v.is_finite());
        assert!(axle.axle_force_n().is_finite());
        assert!(axle.axle_force_n().abs() <= max_rail_force * (1.0 + 1e-9));
        assert!((1..=50).contains(&axle.num_of_substeps()));
        assert!(axle.axle_position_rad() >= -core::f64::consts::PI);
        assert!(axle.axle_position_rad() < core::f64::consts::PI);
    }
    // Past the adhesion peak the rail force settles on the full-slip plateau.
    assert!(axle.is_wheel_slip());
    assert!((axle.axle_force_n() - 0.4 * max_rail_force).abs() < 1.0);
    // Net accelerating force is bounded by drive minus that plateau.
    let a_max = (50_000.0 * 0.99 - 0.4 * max_rail_force) * 0.25 / 200.0;
    assert!(axle.axle_speed_mps() <= a_max * 10.0 * 1.01);
}

#[test]
fn damped_spin_settles_at_slip_limited_speed() {
    let mut p = params();
    p.damping_ns = 5_000.0;
    let mut axle = Axle::new(AxleId::from_index(0), &p, AxleDrive::Force).unwrap();
    axle.train_speed_mps = 0.0;
    axle.drive_force_n = 50_000.0;

    for _ in 0..900 {
        axle.update(0.01);
    }
    let settling = axle.axle_speed_mps();
    for _ in 0..100 {
        axle.update(0.01);
        assert!(axle.axle_speed_mps().is_finite());
    }
    let change = (axle.axle_speed_mps() - settling).abs();
    assert!(change < 1e-3, "speed still moving by {change} m/s per second");

    // drive balanced by the full-slip adhesion plateau plus damping
    let expected = (50_000.0 * 0.99 - 0.4 * 0.33 * 100_000.0) / 5_000.0;
    let v = axle.axle_speed_mps();
    assert!((v - expected).abs() < 0.05, "settled at {v} m/s, expected about {expected}");
    assert!(axle.is_wheel_slip());
}

#[test]
fn unforced_axle_keeps_its_speed() {
    let mut p = params();
    p.axle_weight_n = 0.0;
    for initial in [-7.5, 0.0, 3.0, 22.0] {
        let mut axle = Axle::new(AxleId::from_index(1), &p, AxleDrive::Force).unwrap();
        axle.reset_to_speed(initial);
        axle.train_speed_mps = 0.0;
        for dt in [0.01, 0.05, 0.001, 0.2] {
            axle.update(dt);
            assert_eq!(axle.axle_speed_mps(), initial);
        }
    }
}

#[test]
fn snapshot_restore_reproduces_future() {
    let mut a = Axle::new(AxleId::from_index(2), &params(), AxleDrive::Motor(series_motor())).unwrap();
    a.reset_to_speed(4.0);
    for _ in 0..150 {
        a.update(0.01);
    }
    let saved = a.save_state();

    let mut b = Axle::new(AxleId::from_index(2), &params(), AxleDrive::Motor(series_motor())).unwrap();
    b.restore(Some(&saved)).unwrap();
    assert_eq!(b.save_state(), saved);
    assert_eq!(a, b);

    for _ in 0..100 {
        a.update(0.01);
        b.update(0.01);
    }
    assert_eq!(a.axle_speed_mps(), b.axle_speed_mps());
    assert_eq!(a.axle_force_n(), b.axle_force_n());
    assert_eq!(a.motor().map(|m| m.temperature_k()), b.motor().map(|m| m.temperature_k()));
}

#[test]
fn restore_rejects_mismatched_drive() {
    let mut motored = Axle::new(AxleId::from_index(0), &params(), AxleDrive::Motor(series_motor())).unwrap();
    motored.update(0.01);
    let saved = motored.save_state();

    let mut plain = Axle::new(AxleId::from_index(0), &params(), AxleDrive::Force).unwrap();
    assert!(plain.restore(Some(&saved)).is_err());
}

#[test]
fn motor_drives_axle_forward() {
    let mut axle = Axle::new(AxleId::from_index(3), &params(), AxleDrive::Motor(series_motor())).unwrap();
    assert_eq!(axle.motor().and_then(|m| m.common().axle()), Some(AxleId::from_index(3)));
    assert!(axle.inertia_total_kgm2() > axle.inertia_kgm2());
    for _ in 0..100 {
        axle.update(0.01);
    }
    assert!(axle.axle_speed_mps() > 0.0);
    assert!(axle.drive_force_n > 0.0);
}

proptest! {
    #[test]
    fn threshold_grows_with_k(k in 0.05..3.0f64, dk in 0.01..1.0f64, umax in 0.05..0.6f64) {
        let mut p = params();
        p.adhesion_limit = umax;
        p.adhesion_k = k;
        let low = Axle::new(AxleId::from_index(0), &p, AxleDrive::NotDriven).unwrap();
        p.adhesion_k = k + dk;
        let high = Axle::new(AxleId::from_index(0), &p, AxleDrive::NotDriven).unwrap();
        prop_assert!(high.wheel_slip_threshold_mps() > low.wheel_slip_threshold_mps());
    }

    #[test]
    fn threshold_shrinks_with_adhesion_limit(k in 0.05..3.0f64, umax in 0.05..0.6f64, du in 0.01..0.4f64) {
        let mut p = params();
        p.adhesion_k = k;
        p.adhesion_limit = umax;
        let low = Axle::new(AxleId::from_index(0), &p, AxleDrive::NotDriven).unwrap();
        p.adhesion_limit = umax + du;
        let high = Axle::new(AxleId::from_index(0), &p, AxleDrive::NotDriven).unwrap();
        prop_assert!(high.wheel_slip_threshold_mps() < low.wheel_slip_threshold_mps());
    }

    #[test]
    fn restored_axle_continues_identically(
        drive in -60_000.0f64..60_000.0,
        brake in 0.0f64..20_000.0,
        initial in -10.0f64..10.0,
        before in 1usize..200,
    ) {
        let build = || {
            let mut a = Axle::new(AxleId::from_index(4), &params(), AxleDrive::Force).unwrap();
            a.drive_force_n = drive;
            a.brake_retard_force_n = brake;
            a
        };
        let mut a = build();
        a.reset_to_speed(initial);
        for _ in 0..before {
            a.update(0.01);
        }

        let json = serde_json::to_string(&a.save_state()).unwrap();
        let state: AxleSaveState = serde_json::from_str(&json).unwrap();
        let mut b = build();
        b.restore(Some(&state)).unwrap();
        prop_assert_eq!(&a, &b);

        for _ in 0..50 {
            a.update(0.01);
            b.update(0.01);
        }
        prop_assert_eq!(a, b);
    }
}
