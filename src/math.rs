//! Mathematical utilities and nalgebra extensions for the tilt-fusion library

use nalgebra::{ComplexField, RealField, UnitQuaternion, Vector3};

use crate::types::EulerAngles;

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Distance of `|sin(pitch)|` from 1 below which Euler conversion treats
/// the orientation as gimbal locked (about 0.08° from vertical)
pub const GIMBAL_LOCK_THRESHOLD: f32 = 1e-6;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning `None` if its length is zero or not finite
    fn safe_normalize(&self) -> Option<Vector3<f32>>;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f32>;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Option<Vector3<f32>> {
        if !self.iter().all(|c| c.is_finite()) {
            return None;
        }
        self.try_normalize(f32::EPSILON)
    }

    fn deg_to_rad(&self) -> Vector3<f32> {
        *self * DEG_TO_RAD
    }

    fn rad_to_deg(&self) -> Vector3<f32> {
        *self * RAD_TO_DEG
    }
}

/// Extension trait for UnitQuaternion operations
pub trait QuaternionExt {
    /// Convert to ZYX Euler angles `(roll, pitch, yaw)` in radians
    ///
    /// Near pitch = ±90° roll and yaw rotate about the same axis and only
    /// their difference (or sum) is observable. Within
    /// [`GIMBAL_LOCK_THRESHOLD`] of that singularity pitch is reported as
    /// exactly ±π/2, roll as 0, and the whole rotation about the vertical
    /// goes into yaw, wrapped to (-π, π].
    fn to_euler(&self) -> Vector3<f32>;

    /// Convert to Euler angles in degrees, same conventions as [`to_euler`](Self::to_euler)
    fn to_euler_degrees(&self) -> EulerAngles;

    /// Create quaternion from Euler angles in degrees
    fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32>;
}

impl QuaternionExt for UnitQuaternion<f32> {
    fn to_euler(&self) -> Vector3<f32> {
        let q = self.as_ref();
        let (w, x, y, z) = (q.w, q.i, q.j, q.k);

        let sin_pitch = 2.0 * (w * y - x * z);
        if sin_pitch >= 1.0 - GIMBAL_LOCK_THRESHOLD {
            let yaw = wrap_pi(-2.0 * x.atan2(w));
            return Vector3::new(0.0, core::f32::consts::FRAC_PI_2, yaw);
        }
        if sin_pitch <= -(1.0 - GIMBAL_LOCK_THRESHOLD) {
            let yaw = wrap_pi(2.0 * x.atan2(w));
            return Vector3::new(0.0, -core::f32::consts::FRAC_PI_2, yaw);
        }

        let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let pitch = sin_pitch.asin();
        let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        Vector3::new(roll, pitch, yaw)
    }

    fn to_euler_degrees(&self) -> EulerAngles {
        EulerAngles::from_radians(self.to_euler())
    }

    fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> UnitQuaternion<f32> {
        EulerAngles::new(roll, pitch, yaw).to_quaternion()
    }
}

/// Roll and pitch in degrees of a resting body from its accelerometer reading
///
/// Uses the ZYX convention of [`QuaternionExt::to_euler`]: a level body
/// reads `(0, 0, +g)`. Yaw is unobservable from gravity and is left at 0.
/// Roll covers the full (-180°, 180°] range and jumps between ±180° when the
/// body rolls over upside down; pitch stays within ±90°.
/// Returns `None` for a zero-length or non-finite vector.
pub fn accelerometer_tilt(accelerometer: Vector3<f32>) -> Option<EulerAngles> {
    let a = accelerometer.safe_normalize()?;
    let roll = a.y.atan2(a.z);
    let pitch = (-a.x).atan2((a.y * a.y + a.z * a.z).sqrt());
    Some(EulerAngles::new(roll * RAD_TO_DEG, pitch * RAD_TO_DEG, 0.0))
}

/// Wrap an angle in degrees to (-180°, 180°]
pub fn wrap_degrees(angle: f32) -> f32 {
    let angle = angle % 360.0;
    if angle > 180.0 {
        angle - 360.0
    } else if angle <= -180.0 {
        angle + 360.0
    } else {
        angle
    }
}

fn wrap_pi(angle: f32) -> f32 {
    use core::f32::consts::PI;
    if angle > PI {
        angle - 2.0 * PI
    } else if angle <= -PI {
        angle + 2.0 * PI
    } else {
        angle
    }
}
