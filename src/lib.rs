#![no_std]

//! Tilt Fusion - orientation estimation from a gyroscope and an accelerometer
//!
//! Two independent estimators turn periodic, noisy and biased IMU samples into
//! a drift-corrected orientation:
//!
//! - [`Kalman`]: a two-state (`[angle, bias]`) Kalman filter for a single
//!   axis, fusing the integrated gyroscope rate with an absolute angle. Three
//!   of them make up [`KalmanAxes`] (roll, pitch, yaw).
//! - [`Madgwick`]: a gradient-descent quaternion filter fusing all three
//!   gyroscope axes with the gravity direction measured by the accelerometer.
//!
//! Both implement [`OrientationFilter`]. [`Orientation`] owns one of them,
//! selected by [`EstimatorSettings`], and exposes the same interface whichever
//! is running.
//!
//! # Features
//!
//! - Per-axis Kalman filter with online gyroscope bias estimation
//! - Madgwick IMU filter with gyroscope-only fallback on a zero accelerometer
//! - Quaternion to Euler conversion with a defined gimbal lock convention
//! - Rejection of non-positive time steps and NaN/infinite input
//! - `#![no_std]` compatible for embedded systems
//!
//! # Caller contract
//!
//! Every filter instance belongs to one sensor stream. Samples must be
//! delivered in time order with the elapsed time since the previous sample;
//! the filters cannot detect reordered or duplicated samples. An instance is
//! not synchronised: serialise access if it is shared between threads.
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use tilt_fusion::{EstimatorKind, EstimatorSettings, ImuSample, Orientation};
//!
//! let mut orientation = Orientation::with_settings(EstimatorSettings {
//!     kind: EstimatorKind::Madgwick,
//!     ..Default::default()
//! });
//!
//! // Sensor readings
//! let gyroscope = Vector3::new(0.1, 0.2, 0.3);     // deg/s
//! let accelerometer = Vector3::new(0.0, 0.0, 1.0); // g
//!
//! // Update with a 10 ms sample
//! let sample = ImuSample::new(gyroscope, accelerometer, 0.01);
//! let quaternion = orientation.update(&sample).unwrap();
//!
//! // Roll, pitch and yaw in degrees
//! let angles = orientation.euler_degrees();
//! ```

mod error;
pub mod kalman;
pub mod madgwick;
mod math;
pub mod orientation;
mod types;

// Re-export all public types and functions
pub use error::FilterError;
pub use kalman::Kalman;
pub use madgwick::Madgwick;
pub use math::{
    DEG_TO_RAD, GIMBAL_LOCK_THRESHOLD, QuaternionExt, RAD_TO_DEG, Vector3Ext, accelerometer_tilt,
    wrap_degrees,
};
pub use orientation::{Estimator, KalmanAxes, Orientation, OrientationFilter};
pub use types::*;
