//! Core types and settings for the tilt-fusion library

use nalgebra::{UnitQuaternion, Vector3};

use crate::math::{DEG_TO_RAD, RAD_TO_DEG};

/// Per-axis Kalman filter tuning
///
/// The filter state is `[angle, bias]`. These variances decide how much the
/// filter trusts the integrated gyroscope rate versus the absolute angle
/// measurement.
///
/// # Example
/// ```
/// use tilt_fusion::KalmanSettings;
///
/// let settings = KalmanSettings {
///     r_measure: 0.1, // noisier accelerometer, smoother output
///     ..Default::default()
/// };
/// assert_eq!(settings.q_angle, 0.001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanSettings {
    /// Process noise variance for the angle
    pub q_angle: f32,
    /// Process noise variance for the gyroscope bias
    ///
    /// Larger values let the bias estimate wander faster.
    pub q_bias: f32,
    /// Measurement noise variance of the absolute angle
    ///
    /// Larger values trust the gyroscope more and the angle measurement less.
    pub r_measure: f32,
}

impl Default for KalmanSettings {
    fn default() -> Self {
        Self {
            q_angle: 0.001,
            q_bias: 0.003,
            r_measure: 0.03,
        }
    }
}

/// Madgwick filter tuning
///
/// # Example
/// ```
/// use tilt_fusion::MadgwickSettings;
///
/// let settings = MadgwickSettings { beta: 0.033 };
/// assert!(settings.beta < MadgwickSettings::default().beta);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MadgwickSettings {
    /// Gradient-descent gain in rad/s
    ///
    /// Higher values converge to the accelerometer faster but pass more of
    /// its noise into the estimate.
    pub beta: f32,
}

impl Default for MadgwickSettings {
    fn default() -> Self {
        Self { beta: 0.1 }
    }
}

/// Which estimator an [`Orientation`](crate::Orientation) runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimatorKind {
    /// Three independent angle Kalman filters (roll, pitch, yaw)
    #[default]
    Kalman,
    /// One Madgwick quaternion filter
    Madgwick,
}

/// Orientation estimator settings
///
/// Both tuning blocks are always present; only the one matching `kind` is
/// used.
///
/// # Example
/// ```
/// use tilt_fusion::{EstimatorKind, EstimatorSettings, MadgwickSettings, Orientation};
///
/// let settings = EstimatorSettings {
///     kind: EstimatorKind::Madgwick,
///     madgwick: MadgwickSettings { beta: 0.05 },
///     ..Default::default()
/// };
/// let orientation = Orientation::with_settings(settings);
/// assert_eq!(orientation.kind(), EstimatorKind::Madgwick);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EstimatorSettings {
    /// Estimator selected at construction
    pub kind: EstimatorKind,
    /// Tuning shared by the roll, pitch and yaw Kalman filters
    pub kalman: KalmanSettings,
    /// Tuning for the Madgwick filter
    pub madgwick: MadgwickSettings,
}

/// One IMU sample as delivered by the transport layer
///
/// Samples must be handed to an estimator in time order, with
/// `delta_time` being the time elapsed since the previous sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Angular rate in degrees per second
    pub gyroscope: Vector3<f32>,
    /// Acceleration in any consistent unit; only the direction is used
    pub accelerometer: Vector3<f32>,
    /// Seconds since the previous sample
    pub delta_time: f32,
}

impl ImuSample {
    pub fn new(gyroscope: Vector3<f32>, accelerometer: Vector3<f32>, delta_time: f32) -> Self {
        Self {
            gyroscope,
            accelerometer,
            delta_time,
        }
    }
}

/// Roll, pitch and yaw in degrees (ZYX convention)
///
/// Roll rotates about X, pitch about Y and yaw about Z; the body orientation
/// is `Rz(yaw) * Ry(pitch) * Rx(roll)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl EulerAngles {
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Build from angles in radians
    pub fn from_radians(angles: Vector3<f32>) -> Self {
        let degrees = angles * RAD_TO_DEG;
        Self::new(degrees.x, degrees.y, degrees.z)
    }

    /// Angles in radians as `(roll, pitch, yaw)`
    pub fn to_radians(&self) -> Vector3<f32> {
        Vector3::new(self.roll, self.pitch, self.yaw) * DEG_TO_RAD
    }

    /// Rotation described by these angles
    pub fn to_quaternion(&self) -> UnitQuaternion<f32> {
        let radians = self.to_radians();
        UnitQuaternion::from_euler_angles(radians.x, radians.y, radians.z)
    }
}
