//! Common orientation interface over both estimators
//!
//! [`OrientationFilter`] is the capability shared by the estimators: accept
//! an [`ImuSample`], produce an orientation. [`KalmanAxes`] runs one angle
//! Kalman filter per axis and [`Madgwick`] runs the quaternion filter.
//! [`Orientation`] owns one of them, chosen by [`EstimatorSettings`], and
//! translates each sample into what that estimator consumes.
//!
//! Samples carry gyroscope rates in degrees per second whichever estimator
//! is active.

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::{FilterError, check_finite, check_setting, check_time_step};
use crate::kalman::Kalman;
use crate::madgwick::Madgwick;
use crate::math::{QuaternionExt, Vector3Ext, accelerometer_tilt, wrap_degrees};
use crate::types::{EstimatorKind, EstimatorSettings, EulerAngles, ImuSample, KalmanSettings};

/// An estimator that turns IMU samples into an orientation
///
/// Each instance keeps its own state and must be fed samples of a single
/// sensor stream in time order.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_fusion::{ImuSample, KalmanAxes, Madgwick, OrientationFilter};
///
/// let sample = ImuSample::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0), 0.01);
/// let mut filters: [Box<dyn OrientationFilter>; 2] =
///     [Box::new(KalmanAxes::new()), Box::new(Madgwick::new())];
///
/// for filter in filters.iter_mut() {
///     let quaternion = filter.update(&sample).unwrap();
///     assert!(quaternion.angle() < 1e-6);
/// }
/// ```
pub trait OrientationFilter {
    /// Advance the estimate by one sample and return the new orientation
    fn update(&mut self, sample: &ImuSample) -> Result<UnitQuaternion<f32>, FilterError>;

    /// Current orientation
    fn quaternion(&self) -> UnitQuaternion<f32>;

    /// Current orientation as roll, pitch and yaw in degrees
    fn euler_degrees(&self) -> EulerAngles {
        self.quaternion().to_euler_degrees()
    }

    /// Return to the starting orientation, keeping the tuning
    fn reset(&mut self);
}

/// Roll, pitch and yaw angle Kalman filters
///
/// Roll and pitch are corrected by the tilt of the accelerometer. Gravity
/// carries no heading, so yaw is the bias-compensated integral of the Z
/// gyroscope rate: its measurement is the filter's own prediction.
///
/// Roll and yaw estimates are kept within (-180°, 180°], the same range the
/// quaternion based estimator reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct KalmanAxes {
    roll: Kalman,
    pitch: Kalman,
    yaw: Kalman,
}

impl KalmanAxes {
    pub fn new() -> Self {
        Self::with_settings(KalmanSettings::default())
    }

    /// Create three filters sharing the same tuning
    pub fn with_settings(settings: KalmanSettings) -> Self {
        Self {
            roll: Kalman::with_settings(settings),
            pitch: Kalman::with_settings(settings),
            yaw: Kalman::with_settings(settings),
        }
    }

    /// Update all three axes and return the new angles in degrees
    ///
    /// # Arguments
    /// * `accelerometer` - Acceleration, any unit
    /// * `gyroscope` - Angular rate in degrees per second
    /// * `delta_time` - Seconds since the previous update
    ///
    /// With a zero-length accelerometer reading all three axes run on the
    /// gyroscope alone for this sample.
    pub fn update_angles(
        &mut self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
        delta_time: f32,
    ) -> Result<EulerAngles, FilterError> {
        // Validate once up front so a bad sample never updates only some axes
        check_time_step(delta_time)?;
        check_finite(gyroscope.as_slice())?;
        check_finite(accelerometer.as_slice())?;
        let settings = self.roll.settings();
        check_setting(&[settings.q_angle, settings.q_bias, settings.r_measure])?;

        let (roll_measured, pitch_measured) = match accelerometer_tilt(accelerometer) {
            Some(tilt) => (tilt.roll, tilt.pitch),
            None => {
                log::trace!("zero accelerometer, integrating gyroscope only");
                (
                    predicted_angle(&self.roll, gyroscope.x, delta_time),
                    predicted_angle(&self.pitch, gyroscope.y, delta_time),
                )
            }
        };

        // atan2 jumps between ±180° when rolling over; follow the measurement
        // instead of letting the filter slew through the whole circle.
        let roll_estimate = self.roll.angle();
        if (roll_measured < -90.0 && roll_estimate > 90.0)
            || (roll_measured > 90.0 && roll_estimate < -90.0)
        {
            log::debug!("roll wrapped from {roll_estimate} to {roll_measured}");
            self.roll.set_angle(roll_measured)?;
        }

        let yaw_measured = predicted_angle(&self.yaw, gyroscope.z, delta_time);

        self.roll.update(roll_measured, gyroscope.x, delta_time)?;
        let pitch = self.pitch.update(pitch_measured, gyroscope.y, delta_time)?;
        self.yaw.update(yaw_measured, gyroscope.z, delta_time)?;

        // Gyroscope integration can carry roll and yaw past ±180°
        let roll = wrap_angle(&mut self.roll)?;
        let yaw = wrap_angle(&mut self.yaw)?;

        Ok(EulerAngles::new(roll, pitch, yaw))
    }

    /// Set the three angle estimates in degrees
    ///
    /// Roll and yaw are wrapped to (-180°, 180°]. Nothing is changed if any
    /// angle is NaN or infinite.
    pub fn set_angles(&mut self, angles: EulerAngles) -> Result<(), FilterError> {
        check_setting(&[angles.roll, angles.pitch, angles.yaw])?;
        self.roll.set_angle(wrap_degrees(angles.roll))?;
        self.pitch.set_angle(angles.pitch)?;
        self.yaw.set_angle(wrap_degrees(angles.yaw))?;
        Ok(())
    }

    /// Current angle estimates in degrees
    pub fn angles(&self) -> EulerAngles {
        EulerAngles::new(self.roll.angle(), self.pitch.angle(), self.yaw.angle())
    }

    /// Unbiased rates of the last update in degrees per second
    pub fn rates(&self) -> Vector3<f32> {
        Vector3::new(self.roll.rate(), self.pitch.rate(), self.yaw.rate())
    }

    /// Estimated gyroscope biases in degrees per second
    pub fn biases(&self) -> Vector3<f32> {
        Vector3::new(self.roll.bias(), self.pitch.bias(), self.yaw.bias())
    }

    /// Apply the same tuning to all three filters, keeping their state
    pub fn set_settings(&mut self, settings: KalmanSettings) -> Result<(), FilterError> {
        self.roll.set_settings(settings)?;
        self.pitch.set_settings(settings)?;
        self.yaw.set_settings(settings)?;
        Ok(())
    }

    pub fn roll(&self) -> &Kalman {
        &self.roll
    }

    pub fn pitch(&self) -> &Kalman {
        &self.pitch
    }

    pub fn yaw(&self) -> &Kalman {
        &self.yaw
    }
}

impl OrientationFilter for KalmanAxes {
    fn update(&mut self, sample: &ImuSample) -> Result<UnitQuaternion<f32>, FilterError> {
        self.update_angles(sample.accelerometer, sample.gyroscope, sample.delta_time)?;
        Ok(self.quaternion())
    }

    fn quaternion(&self) -> UnitQuaternion<f32> {
        self.angles().to_quaternion()
    }

    fn euler_degrees(&self) -> EulerAngles {
        self.angles()
    }

    fn reset(&mut self) {
        self.roll.reset();
        self.pitch.reset();
        self.yaw.reset();
    }
}

impl OrientationFilter for Madgwick {
    fn update(&mut self, sample: &ImuSample) -> Result<UnitQuaternion<f32>, FilterError> {
        Madgwick::update(
            self,
            sample.gyroscope.deg_to_rad(),
            sample.accelerometer,
            sample.delta_time,
        )
    }

    fn quaternion(&self) -> UnitQuaternion<f32> {
        Madgwick::quaternion(self)
    }

    fn reset(&mut self) {
        Madgwick::reset(self);
    }
}

/// The estimator an [`Orientation`] is running
#[derive(Debug, Clone, Copy)]
pub enum Estimator {
    Kalman(KalmanAxes),
    Madgwick(Madgwick),
}

impl Estimator {
    fn from_settings(settings: &EstimatorSettings) -> Self {
        match settings.kind {
            EstimatorKind::Kalman => Estimator::Kalman(KalmanAxes::with_settings(settings.kalman)),
            EstimatorKind::Madgwick => {
                Estimator::Madgwick(Madgwick::with_settings(settings.madgwick))
            }
        }
    }

    fn filter(&self) -> &dyn OrientationFilter {
        match self {
            Estimator::Kalman(axes) => axes,
            Estimator::Madgwick(madgwick) => madgwick,
        }
    }

    fn filter_mut(&mut self) -> &mut dyn OrientationFilter {
        match self {
            Estimator::Kalman(axes) => axes,
            Estimator::Madgwick(madgwick) => madgwick,
        }
    }

    fn set_angles(&mut self, angles: EulerAngles) -> Result<(), FilterError> {
        match self {
            Estimator::Kalman(axes) => axes.set_angles(angles),
            Estimator::Madgwick(madgwick) => madgwick.set_quaternion(angles.to_quaternion()),
        }
    }
}

/// Orientation estimate from a stream of IMU samples
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_fusion::{EstimatorKind, EstimatorSettings, ImuSample, Orientation};
///
/// let mut orientation = Orientation::with_settings(EstimatorSettings {
///     kind: EstimatorKind::Kalman,
///     ..Default::default()
/// });
///
/// let accelerometer = Vector3::new(0.0, 0.5, 0.866); // rolled by 30°
/// orientation.align(accelerometer);
///
/// let sample = ImuSample::new(Vector3::zeros(), accelerometer, 0.01);
/// orientation.update(&sample).unwrap();
///
/// let angles = orientation.euler_degrees();
/// assert!((angles.roll - 30.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Orientation {
    settings: EstimatorSettings,
    estimator: Estimator,
}

impl Orientation {
    /// Create an orientation estimator with default settings
    pub fn new() -> Self {
        Self::with_settings(EstimatorSettings::default())
    }

    /// Create an orientation estimator with the given settings
    pub fn with_settings(settings: EstimatorSettings) -> Self {
        Self {
            settings,
            estimator: Estimator::from_settings(&settings),
        }
    }

    /// Update with one sample and return the new orientation
    pub fn update(&mut self, sample: &ImuSample) -> Result<UnitQuaternion<f32>, FilterError> {
        self.estimator.filter_mut().update(sample)
    }

    /// Get current orientation quaternion
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.estimator.filter().quaternion()
    }

    /// Current orientation as roll, pitch and yaw in degrees
    pub fn euler_degrees(&self) -> EulerAngles {
        self.estimator.filter().euler_degrees()
    }

    /// Snap roll and pitch to the tilt of a resting accelerometer reading
    ///
    /// Yaw is kept. Returns `false` and changes nothing when the reading has
    /// no direction.
    pub fn align(&mut self, accelerometer: Vector3<f32>) -> bool {
        let Some(tilt) = accelerometer_tilt(accelerometer) else {
            return false;
        };
        let yaw = self.euler_degrees().yaw;
        let angles = EulerAngles::new(tilt.roll, tilt.pitch, yaw);
        log::debug!("aligning to roll {} pitch {}", angles.roll, angles.pitch);

        self.estimator.set_angles(angles).is_ok()
    }

    /// Return to the starting orientation, keeping the settings
    pub fn reset(&mut self) {
        self.estimator.filter_mut().reset();
    }

    /// Get current settings
    pub fn settings(&self) -> EstimatorSettings {
        self.settings
    }

    /// Update settings
    ///
    /// Tuning changes keep the current estimate. Changing the estimator kind
    /// starts a fresh estimator of the new kind at the current orientation.
    /// Settings holding a NaN or infinite value are rejected and nothing
    /// changes.
    pub fn set_settings(&mut self, settings: EstimatorSettings) -> Result<(), FilterError> {
        check_setting(&[
            settings.kalman.q_angle,
            settings.kalman.q_bias,
            settings.kalman.r_measure,
            settings.madgwick.beta,
        ])?;

        if settings.kind == self.settings.kind {
            match &mut self.estimator {
                Estimator::Kalman(axes) => axes.set_settings(settings.kalman)?,
                Estimator::Madgwick(madgwick) => madgwick.set_settings(settings.madgwick)?,
            }
        } else {
            let mut estimator = Estimator::from_settings(&settings);
            estimator.set_angles(self.euler_degrees())?;
            self.estimator = estimator;
        }
        self.settings = settings;
        Ok(())
    }

    /// Estimator kind selected at construction
    pub fn kind(&self) -> EstimatorKind {
        self.settings.kind
    }

    /// The running estimator
    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationFilter for Orientation {
    fn update(&mut self, sample: &ImuSample) -> Result<UnitQuaternion<f32>, FilterError> {
        Orientation::update(self, sample)
    }

    fn quaternion(&self) -> UnitQuaternion<f32> {
        Orientation::quaternion(self)
    }

    fn euler_degrees(&self) -> EulerAngles {
        Orientation::euler_degrees(self)
    }

    fn reset(&mut self) {
        Orientation::reset(self);
    }
}

/// Angle the filter would reach from its gyroscope rate alone
fn predicted_angle(kalman: &Kalman, rate: f32, delta_time: f32) -> f32 {
    kalman.angle() + delta_time * (rate - kalman.bias())
}

fn wrap_angle(kalman: &mut Kalman) -> Result<f32, FilterError> {
    let angle = wrap_degrees(kalman.angle());
    kalman.set_angle(angle)?;
    Ok(angle)
}
