//! Madgwick gradient-descent orientation filter (IMU variant)

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::{FilterError, check_finite, check_setting, check_time_step};
use crate::math::{QuaternionExt, Vector3Ext};
use crate::types::MadgwickSettings;

/// Madgwick orientation filter
///
/// Integrates the gyroscope into an orientation quaternion and, on every
/// sample with a usable accelerometer reading, steps the quaternion down the
/// gradient of the misalignment between the predicted and the measured
/// gravity direction.
///
/// Gyroscope input is in radians per second. The accelerometer may be in any
/// unit; only its direction is used.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_fusion::Madgwick;
///
/// let mut madgwick = Madgwick::new();
///
/// let gyroscope = Vector3::new(0.0, 0.0, 0.0);     // rad/s
/// let accelerometer = Vector3::new(0.0, 0.0, 1.0); // g
/// let quaternion = madgwick.update(gyroscope, accelerometer, 0.01).unwrap();
///
/// assert!((quaternion.angle()).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Madgwick {
    /// Filter settings
    settings: MadgwickSettings,
    /// Current orientation, body to earth
    quaternion: UnitQuaternion<f32>,
}

impl Madgwick {
    /// Create a filter with default gain at the identity orientation
    pub fn new() -> Self {
        Self::with_settings(MadgwickSettings::default())
    }

    /// Create a filter with the given settings at the identity orientation
    pub fn with_settings(settings: MadgwickSettings) -> Self {
        Self {
            settings,
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// Update the orientation with one gyroscope and accelerometer sample
    ///
    /// A zero-length accelerometer reading skips the correction step and the
    /// sample is integrated from the gyroscope alone.
    ///
    /// # Arguments
    /// * `gyroscope` - Angular rate in radians per second
    /// * `accelerometer` - Acceleration, any unit
    /// * `delta_time` - Seconds since the previous update
    ///
    /// # Errors
    /// Rejects a non-positive or non-finite `delta_time` and non-finite
    /// readings without touching the filter state. A non-finite gain passed
    /// to [`with_settings`](Self::with_settings) is reported as
    /// [`FilterError::InvalidSetting`].
    pub fn update(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        delta_time: f32,
    ) -> Result<UnitQuaternion<f32>, FilterError> {
        check_time_step(delta_time)?;
        check_finite(gyroscope.as_slice())?;
        check_finite(accelerometer.as_slice())?;
        check_setting(&[self.settings.beta])?;

        let mut q_dot = self.gyroscope_derivative(gyroscope);
        match self.gradient_step(accelerometer) {
            Some(step) => q_dot = q_dot - step * self.settings.beta,
            None => log::trace!("accelerometer correction skipped"),
        }

        self.integrate(q_dot, delta_time);
        Ok(self.quaternion)
    }

    /// Update the orientation from the gyroscope alone
    pub fn update_gyro(
        &mut self,
        gyroscope: Vector3<f32>,
        delta_time: f32,
    ) -> Result<UnitQuaternion<f32>, FilterError> {
        check_time_step(delta_time)?;
        check_finite(gyroscope.as_slice())?;

        let q_dot = self.gyroscope_derivative(gyroscope);
        self.integrate(q_dot, delta_time);
        Ok(self.quaternion)
    }

    /// Get current orientation quaternion
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    /// Set orientation quaternion directly
    ///
    /// A quaternion with a NaN or infinite component is rejected.
    pub fn set_quaternion(&mut self, quaternion: UnitQuaternion<f32>) -> Result<(), FilterError> {
        check_setting(quaternion.coords.as_slice())?;
        self.quaternion = quaternion;
        Ok(())
    }

    /// Current orientation as `(roll, pitch, yaw)` in radians
    ///
    /// See [`QuaternionExt::to_euler`] for the gimbal lock convention.
    pub fn euler_angles(&self) -> Vector3<f32> {
        self.quaternion.to_euler()
    }

    pub fn beta(&self) -> f32 {
        self.settings.beta
    }

    pub fn set_beta(&mut self, beta: f32) -> Result<(), FilterError> {
        check_setting(&[beta])?;
        self.settings.beta = beta;
        Ok(())
    }

    /// Get current settings
    pub fn settings(&self) -> MadgwickSettings {
        self.settings
    }

    /// Replace the settings, keeping the orientation
    pub fn set_settings(&mut self, settings: MadgwickSettings) -> Result<(), FilterError> {
        check_setting(&[settings.beta])?;
        self.settings = settings;
        Ok(())
    }

    /// Return to the identity orientation, keeping the settings
    pub fn reset(&mut self) {
        self.quaternion = UnitQuaternion::identity();
    }

    /// Rate of change of the quaternion from the angular rate: `0.5 * q ⊗ (0, ω)`
    fn gyroscope_derivative(&self, gyroscope: Vector3<f32>) -> Quaternion<f32> {
        (self.quaternion.as_ref() * Quaternion::from_parts(0.0, gyroscope)) * 0.5
    }

    /// Normalized gradient of the gravity alignment objective
    ///
    /// Returns `None` when the accelerometer or the gradient has no usable
    /// direction.
    fn gradient_step(&self, accelerometer: Vector3<f32>) -> Option<Quaternion<f32>> {
        let a = accelerometer.safe_normalize()?;

        let q = self.quaternion.as_ref();
        let (w, x, y, z) = (q.w, q.i, q.j, q.k);

        // Gravity predicted by the current orientation minus the measured one
        let f1 = 2.0 * (x * z - w * y) - a.x;
        let f2 = 2.0 * (w * x + y * z) - a.y;
        let f3 = 2.0 * (0.5 - x * x - y * y) - a.z;

        // Jacobian transposed times objective
        let gradient = Quaternion::new(
            -2.0 * y * f1 + 2.0 * x * f2,
            2.0 * z * f1 + 2.0 * w * f2 - 4.0 * x * f3,
            -2.0 * w * f1 + 2.0 * z * f2 - 4.0 * y * f3,
            2.0 * x * f1 + 2.0 * y * f2,
        );

        let norm = gradient.norm();
        if norm <= f32::EPSILON {
            return None;
        }
        Some(gradient / norm)
    }

    /// First-order integration followed by renormalization
    fn integrate(&mut self, q_dot: Quaternion<f32>, delta_time: f32) {
        let candidate = self.quaternion.as_ref() + q_dot * delta_time;
        let norm = candidate.norm();

        self.quaternion = if norm.is_finite() && norm > f32::EPSILON {
            UnitQuaternion::new_unchecked(candidate / norm)
        } else {
            log::warn!("degenerate quaternion {candidate:?}, resetting to identity");
            UnitQuaternion::identity()
        };
    }
}

impl Default for Madgwick {
    fn default() -> Self {
        Self::new()
    }
}
