//! Single-axis angle Kalman filter
//!
//! Fuses an integrated gyroscope rate with an absolute angle measurement
//! (typically the tilt computed from the accelerometer). The state vector is
//! `[angle, bias]`: the filter estimates a constant gyroscope bias alongside
//! the angle and subtracts it from every rate it integrates.

use crate::error::{FilterError, check_finite, check_setting, check_time_step};
use crate::types::KalmanSettings;

/// Angle Kalman filter for one axis
///
/// Angles are in degrees, rates in degrees per second and time steps in
/// seconds.
///
/// # Example
/// ```
/// use tilt_fusion::Kalman;
///
/// let mut kalman = Kalman::new();
/// kalman.set_angle(2.0).unwrap(); // starting angle, e.g. from the accelerometer
///
/// // accelerometer says 2.5°, gyroscope reads 0.1°/s, 10 ms since last sample
/// let angle = kalman.update(2.5, 0.1, 0.01).unwrap();
/// assert!(angle > 2.0 && angle < 2.5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Kalman {
    /// Tuning variances
    settings: KalmanSettings,
    /// Estimated angle
    angle: f32,
    /// Estimated gyroscope bias
    bias: f32,
    /// Rate of the last update with the bias removed
    rate: f32,
    /// Error covariance of `[angle, bias]`
    p: [[f32; 2]; 2],
}

impl Kalman {
    /// Create a filter with default tuning, angle 0 and zero covariance
    pub fn new() -> Self {
        Self::with_settings(KalmanSettings::default())
    }

    /// Create a filter with the given tuning
    pub fn with_settings(settings: KalmanSettings) -> Self {
        Self {
            settings,
            angle: 0.0,
            bias: 0.0,
            rate: 0.0,
            // The starting angle is set by the caller and the bias is assumed
            // zero, so the filter starts fully certain of both.
            p: [[0.0, 0.0], [0.0, 0.0]],
        }
    }

    /// Advance the filter by one sample and return the new angle estimate
    ///
    /// # Arguments
    /// * `measured_angle` - Absolute angle measurement in degrees
    /// * `measured_rate` - Gyroscope rate about the same axis in degrees per second
    /// * `delta_time` - Seconds since the previous update
    ///
    /// # Errors
    /// Rejects a non-positive or non-finite `delta_time` and non-finite
    /// measurements without touching the filter state. Non-finite tuning
    /// passed to [`with_settings`](Self::with_settings) is reported as
    /// [`FilterError::InvalidSetting`] on every update.
    pub fn update(
        &mut self,
        measured_angle: f32,
        measured_rate: f32,
        delta_time: f32,
    ) -> Result<f32, FilterError> {
        check_time_step(delta_time)?;
        check_finite(&[measured_angle, measured_rate])?;

        let dt = delta_time;
        let KalmanSettings {
            q_angle,
            q_bias,
            r_measure,
        } = self.settings;
        check_setting(&[q_angle, q_bias, r_measure])?;
        let p = &mut self.p;

        // Predict
        self.rate = measured_rate - self.bias;
        self.angle += dt * self.rate;

        p[0][0] += dt * (dt * p[1][1] - p[0][1] - p[1][0] + q_angle);
        p[0][1] -= dt * p[1][1];
        p[1][0] -= dt * p[1][1];
        p[1][1] += q_bias * dt;

        // Correct
        let s = p[0][0] + r_measure;
        let k0 = p[0][0] / s;
        let k1 = p[1][0] / s;

        let y = measured_angle - self.angle;
        self.angle += k0 * y;
        self.bias += k1 * y;

        // In-place covariance update: the second row reads the first row
        // after it has already been corrected.
        p[0][0] -= k0 * p[0][0];
        p[0][1] -= k0 * p[0][1];
        p[1][0] -= k1 * p[0][0];
        p[1][1] -= k1 * p[0][1];

        Ok(self.angle)
    }

    /// Set the angle estimate, typically the starting angle
    ///
    /// A NaN or infinite angle is rejected and the estimate is kept.
    pub fn set_angle(&mut self, angle: f32) -> Result<(), FilterError> {
        check_setting(&[angle])?;
        self.angle = angle;
        Ok(())
    }

    /// Current angle estimate in degrees
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Rate of the last update with the estimated bias removed, in degrees per second
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Estimated gyroscope bias in degrees per second
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Error covariance of `[angle, bias]`
    pub fn covariance(&self) -> [[f32; 2]; 2] {
        self.p
    }

    pub fn q_angle(&self) -> f32 {
        self.settings.q_angle
    }

    pub fn set_q_angle(&mut self, q_angle: f32) -> Result<(), FilterError> {
        check_setting(&[q_angle])?;
        self.settings.q_angle = q_angle;
        Ok(())
    }

    pub fn q_bias(&self) -> f32 {
        self.settings.q_bias
    }

    pub fn set_q_bias(&mut self, q_bias: f32) -> Result<(), FilterError> {
        check_setting(&[q_bias])?;
        self.settings.q_bias = q_bias;
        Ok(())
    }

    pub fn r_measure(&self) -> f32 {
        self.settings.r_measure
    }

    pub fn set_r_measure(&mut self, r_measure: f32) -> Result<(), FilterError> {
        check_setting(&[r_measure])?;
        self.settings.r_measure = r_measure;
        Ok(())
    }

    /// Get current tuning
    pub fn settings(&self) -> KalmanSettings {
        self.settings
    }

    /// Replace the tuning, keeping the estimated state
    ///
    /// Tuning with a NaN or infinite value is rejected as a whole.
    pub fn set_settings(&mut self, settings: KalmanSettings) -> Result<(), FilterError> {
        check_setting(&[settings.q_angle, settings.q_bias, settings.r_measure])?;
        self.settings = settings;
        Ok(())
    }

    /// Return to angle 0, zero bias and zero covariance, keeping the tuning
    pub fn reset(&mut self) {
        *self = Self::with_settings(self.settings);
    }
}

impl Default for Kalman {
    fn default() -> Self {
        Self::new()
    }
}
