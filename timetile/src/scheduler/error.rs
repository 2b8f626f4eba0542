//! Scheduler error types.

use thiserror::Error;

use crate::address::AddressError;

/// Errors from viewport checks.
///
/// Only invalid input errors. A valid viewport never fails, whatever the
/// state of the data source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// Bounds are not finite or `min > max`.
    #[error("Invalid viewport [{min}, {max}]")]
    InvalidViewport { min: f64, max: f64 },

    /// `check_viewport` was called without a viewport provider.
    #[error("No viewport provider configured")]
    NoViewportProvider,

    /// Level out of range.
    #[error(transparent)]
    Address(#[from] AddressError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SchedulerError::InvalidViewport { min: 5.0, max: 1.0 };
        assert_eq!(err.to_string(), "Invalid viewport [5, 1]");

        let err: SchedulerError = AddressError::LevelOutOfRange(99).into();
        assert_eq!(err.to_string(), "Level 99 out of range (-64 to 64)");
    }
}
