use nalgebra::{UnitQuaternion, Vector3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tilt_fusion::{
    EstimatorKind, EstimatorSettings, FilterError, ImuSample, Kalman, KalmanAxes, KalmanSettings,
    Madgwick, MadgwickSettings, Orientation, OrientationFilter, QuaternionExt, wrap_degrees,
};

const EPSILON: f32 = 1e-6;

fn gravity_at(roll: f32, pitch: f32) -> Vector3<f32> {
    let attitude = UnitQuaternion::from_euler_degrees(roll, pitch, 0.0);
    attitude.inverse() * Vector3::<f32>::z()
}

/// Test that the angle converges to a constant true angle with a precise measurement
#[test]
fn test_kalman_convergence() {
    let mut kalman = Kalman::with_settings(KalmanSettings {
        r_measure: 1e-6,
        ..Default::default()
    });

    let mut angle = 0.0;
    for _ in 0..50 {
        angle = kalman.update(25.0, 0.0, 0.01).unwrap();
    }

    assert!((angle - 25.0).abs() < 1e-3, "angle: {}", angle);
}

/// Test that a constant gyroscope bias is learned from periodic angle corrections
#[test]
fn test_kalman_bias_rejection() {
    let true_angle = 15.0;
    let true_bias = 2.5;

    for seed in 0..5 {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut kalman = Kalman::new();
        kalman.set_angle(true_angle).unwrap();

        for _ in 0..3000 {
            let measured_angle = true_angle + rng.random_range(-1.0..1.0);
            let measured_rate = true_bias + rng.random_range(-0.5..0.5);
            kalman.update(measured_angle, measured_rate, 0.01).unwrap();
        }

        assert!(
            (kalman.bias() - true_bias).abs() < 0.4,
            "seed {}: bias {}",
            seed,
            kalman.bias()
        );
        assert!(
            (kalman.angle() - true_angle).abs() < 0.5,
            "seed {}: angle {}",
            seed,
            kalman.angle()
        );
        // The unbiased rate of a resting body is close to zero
        assert!(
            kalman.rate().abs() < 1.0,
            "seed {}: rate {}",
            seed,
            kalman.rate()
        );
    }
}

/// Test that the quaternion stays unit length through random motion
#[test]
fn test_madgwick_unit_norm_invariant() {
    let mut rng = Pcg64::seed_from_u64(7);
    let mut madgwick = Madgwick::new();

    for step in 0..5000 {
        let gyroscope = Vector3::new(
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
        );
        // Include exact zeros now and then
        let accelerometer = if step % 97 == 0 {
            Vector3::zeros()
        } else {
            Vector3::new(
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
            )
        };
        let delta_time = rng.random_range(0.001..0.05);

        let q = madgwick.update(gyroscope, accelerometer, delta_time).unwrap();
        let norm_squared = q.w * q.w + q.i * q.i + q.j * q.j + q.k * q.k;
        assert!(
            (norm_squared - 1.0).abs() < 1e-5,
            "step {}: |q|² = {}",
            step,
            norm_squared
        );
    }
}

/// Test that setters are read back unchanged and leave the state alone
#[test]
fn test_accessor_idempotence() {
    let mut kalman = Kalman::new();
    kalman.set_angle(12.0).unwrap();
    kalman.update(12.5, 0.3, 0.01).unwrap();
    let (angle, bias, rate, covariance) = (
        kalman.angle(),
        kalman.bias(),
        kalman.rate(),
        kalman.covariance(),
    );

    for value in [0.0, 1e-5, 0.25, 3.0] {
        kalman.set_q_angle(value).unwrap();
        assert_eq!(kalman.q_angle(), value);
        kalman.set_q_bias(value).unwrap();
        assert_eq!(kalman.q_bias(), value);
        kalman.set_r_measure(value).unwrap();
        assert_eq!(kalman.r_measure(), value);
    }

    assert_eq!(kalman.angle(), angle);
    assert_eq!(kalman.bias(), bias);
    assert_eq!(kalman.rate(), rate);
    assert_eq!(kalman.covariance(), covariance);

    let mut madgwick = Madgwick::new();
    let start = UnitQuaternion::from_euler_degrees(5.0, 10.0, 15.0);
    madgwick.set_quaternion(start).unwrap();
    let quaternion = madgwick.quaternion();
    for beta in [0.0, 0.033, 0.5] {
        madgwick.set_beta(beta).unwrap();
        assert_eq!(madgwick.beta(), beta);
    }
    assert_eq!(madgwick.quaternion(), quaternion);
}

/// Test that degenerate accelerometer input never poisons the state
#[test]
fn test_degenerate_input_safety() {
    let mut madgwick = Madgwick::new();
    let mut axes = KalmanAxes::new();

    for _ in 0..1000 {
        let q = madgwick
            .update(Vector3::new(0.5, -0.25, 0.1), Vector3::zeros(), 0.01)
            .unwrap();
        assert!(q.coords.iter().all(|c| c.is_finite()));

        let angles = axes
            .update_angles(Vector3::zeros(), Vector3::new(5.0, -2.0, 1.0), 0.01)
            .unwrap();
        assert!(
            angles.roll.is_finite() && angles.pitch.is_finite() && angles.yaw.is_finite()
        );
    }

    // Tiny but non-zero readings are normalized, not amplified into NaN
    let q = madgwick
        .update(Vector3::zeros(), Vector3::new(1e-20, 0.0, 1e-20), 0.01)
        .unwrap();
    assert!(q.coords.iter().all(|c| c.is_finite()));
}

/// Test that invalid time steps are reported and ignored
#[test]
fn test_invalid_time_step_rejected() {
    for kind in [EstimatorKind::Kalman, EstimatorKind::Madgwick] {
        let mut orientation = Orientation::with_settings(EstimatorSettings {
            kind,
            ..Default::default()
        });
        orientation.align(gravity_at(10.0, 20.0));
        let before = orientation.quaternion();

        for delta_time in [0.0, -0.01, f32::NAN, f32::INFINITY] {
            let sample = ImuSample::new(Vector3::new(1.0, 2.0, 3.0), Vector3::z(), delta_time);
            let result = orientation.update(&sample);
            assert!(
                matches!(result, Err(FilterError::InvalidTimeStep(_))),
                "{:?} dt {}: {:?}",
                kind,
                delta_time,
                result
            );
        }

        assert_eq!(orientation.quaternion(), before, "{:?}", kind);
    }
}

/// Test Madgwick with gravity along Z, no rotation, from identity
#[test]
fn test_madgwick_identity_scenario() {
    let mut madgwick = Madgwick::with_settings(MadgwickSettings { beta: 0.1 });

    let q = madgwick
        .update(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0), 0.01)
        .unwrap();

    assert!((q.w - 1.0).abs() < EPSILON);
    assert!(q.i.abs() < EPSILON);
    assert!(q.j.abs() < EPSILON);
    assert!(q.k.abs() < EPSILON);
}

/// Test Kalman defaults, angle 0, 10° measurement, one second step
#[test]
fn test_kalman_first_step_scenario() {
    let mut kalman = Kalman::with_settings(KalmanSettings {
        q_angle: 0.001,
        q_bias: 0.003,
        r_measure: 0.03,
    });
    kalman.set_angle(0.0).unwrap();

    let angle = kalman.update(10.0, 0.0, 1.0).unwrap();

    assert!(angle > 0.0 && angle < 10.0);
    assert!((angle - 10.0 / 31.0).abs() < EPSILON);
}

/// Test that both estimators agree when driven through the common interface
#[test]
fn test_estimators_agree_on_rotation() {
    let mut filters: Vec<Box<dyn OrientationFilter>> =
        vec![Box::new(KalmanAxes::new()), Box::new(Madgwick::new())];

    // Roll at 10°/s for three seconds with a matching accelerometer
    let rate = 10.0;
    let delta_time = 0.01;
    for step in 1..=300 {
        let roll = rate * delta_time * step as f32;
        let gyroscope = Vector3::new(rate, 0.0, 0.0);
        let sample = ImuSample::new(gyroscope, gravity_at(roll, 0.0), delta_time);
        for filter in filters.iter_mut() {
            filter.update(&sample).unwrap();
        }
    }

    for filter in &filters {
        let angles = filter.euler_degrees();
        assert!((angles.roll - 30.0).abs() < 0.5, "roll {}", angles.roll);
        assert!(angles.pitch.abs() < 0.5, "pitch {}", angles.pitch);
        assert!(angles.yaw.abs() < 0.5, "yaw {}", angles.yaw);
    }
}

/// Test that the Kalman path snaps through the ±180° roll discontinuity
#[test]
fn test_kalman_roll_over() {
    let mut orientation = Orientation::new();
    orientation.align(gravity_at(175.0, 0.0));

    // Keep rolling at 20°/s through 180°
    let delta_time = 0.01;
    let mut roll = 175.0f32;
    for _ in 0..100 {
        roll += 20.0 * delta_time;
        let accelerometer = gravity_at(wrap_degrees(roll), 0.0);
        let sample = ImuSample::new(Vector3::new(20.0, 0.0, 0.0), accelerometer, delta_time);
        orientation.update(&sample).unwrap();
    }

    // 175 + 20 = 195, reported as -165
    let angles = orientation.euler_degrees();
    assert!((angles.roll + 165.0).abs() < 1.0, "roll {}", angles.roll);
}

/// Test that both estimators report yaw in (-180°, 180°] after a long turn
#[test]
fn test_estimators_agree_on_yaw_past_half_turn() {
    let mut yaws = Vec::new();

    // 100°/s about Z for five seconds is 500°, which is 140°
    for kind in [EstimatorKind::Kalman, EstimatorKind::Madgwick] {
        let mut orientation = Orientation::with_settings(EstimatorSettings {
            kind,
            ..Default::default()
        });
        let sample = ImuSample::new(Vector3::new(0.0, 0.0, 100.0), Vector3::z(), 0.01);
        for _ in 0..500 {
            orientation.update(&sample).unwrap();
        }

        let yaw = orientation.euler_degrees().yaw;
        assert!((yaw - 140.0).abs() < 0.1, "{:?} yaw {}", kind, yaw);
        yaws.push(yaw);
    }

    assert!((yaws[0] - yaws[1]).abs() < 0.1, "yaws {:?}", yaws);
}
