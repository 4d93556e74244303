//! Error type for rejected filter input

use core::fmt;

/// Input rejected by a filter update
///
/// A rejected update leaves the filter state exactly as it was before the
/// call, so a caller may drop the offending sample and continue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterError {
    /// Time step was zero, negative, or not finite (seconds)
    InvalidTimeStep(f32),
    /// A measurement component was NaN or infinite
    NonFiniteInput,
    /// A tuning value or an initial state was NaN or infinite
    InvalidSetting,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::InvalidTimeStep(dt) => {
                write!(f, "time step must be positive and finite, got {dt} s")
            }
            FilterError::NonFiniteInput => write!(f, "measurement contains NaN or infinity"),
            FilterError::InvalidSetting => write!(f, "setting must be finite"),
        }
    }
}

impl core::error::Error for FilterError {}

/// Reject time steps that would poison the filter state
pub(crate) fn check_time_step(delta_time: f32) -> Result<(), FilterError> {
    if delta_time.is_finite() && delta_time > 0.0 {
        Ok(())
    } else {
        log::debug!("rejecting time step {delta_time}");
        Err(FilterError::InvalidTimeStep(delta_time))
    }
}

/// Reject NaN or infinite measurement components
pub(crate) fn check_finite(values: &[f32]) -> Result<(), FilterError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        log::debug!("rejecting non-finite measurement");
        Err(FilterError::NonFiniteInput)
    }
}

/// Reject NaN or infinite tuning values and initial states
pub(crate) fn check_setting(values: &[f32]) -> Result<(), FilterError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        log::debug!("rejecting non-finite setting");
        Err(FilterError::InvalidSetting)
    }
}
