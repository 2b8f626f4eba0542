//! Retry policy for failed fetches.
//!
//! The policy bounds how many times a failing address is re-fetched and how
//! long each re-fetch waits before its request is driven.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use timetile::scheduler::{Backoff, RetryPolicy};
//!
//! // Five retries, doubling from 100ms
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.delay_for_retry(1), Some(Duration::from_millis(100)));
//! assert_eq!(policy.delay_for_retry(3), Some(Duration::from_millis(400)));
//! assert_eq!(policy.delay_for_retry(6), None);
//!
//! // Retry at once, the way a bare callback client does
//! let policy = RetryPolicy::new(5, Backoff::Immediate);
//! assert_eq!(policy.delay_for_retry(1), Some(Duration::ZERO));
//! ```

use std::fmt;
use std::time::Duration;

// =============================================================================
// Retry Policy Constants
// =============================================================================

/// Default number of re-fetches after the first failure.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default initial delay for exponential backoff (100ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 100;

/// Default maximum delay for exponential backoff (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Delay schedule between a failure and its re-fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum Backoff {
    /// Re-fetch as soon as the failure is handled.
    Immediate,

    /// Constant delay before every re-fetch.
    Fixed(Duration),

    /// Exponential backoff with a cap.
    ///
    /// The delay before retry `n` (1-based) is `initial * multiplier^(n-1)`,
    /// never more than `max`.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Maximum delay cap.
        max: Duration,
        /// Multiplier applied after each failure (typically 2.0).
        multiplier: f64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Immediate
    }
}

impl Backoff {
    /// Exponential backoff with the default parameters.
    ///
    /// Uses:
    /// - Initial delay: 100ms ([`DEFAULT_INITIAL_DELAY_MS`])
    /// - Max delay: 30 seconds ([`DEFAULT_MAX_DELAY_SECS`])
    /// - Multiplier: 2.0 ([`DEFAULT_BACKOFF_MULTIPLIER`])
    pub fn exponential() -> Self {
        Self::Exponential {
            initial: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        match self {
            Self::Immediate => Duration::ZERO,
            Self::Fixed(delay) => *delay,
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
                let secs = initial.as_secs_f64() * multiplier.powi(exponent);
                if secs.is_finite() && secs >= 0.0 && secs < max.as_secs_f64() {
                    Duration::from_secs_f64(secs)
                } else {
                    *max
                }
            }
        }
    }

    /// Short name, as used in the config file.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Fixed(_) => "fixed",
            Self::Exponential { .. } => "exponential",
        }
    }
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => write!(f, "immediate"),
            Self::Fixed(delay) => write!(f, "fixed({:?})", delay),
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => write!(f, "exponential({:?} x{} up to {:?})", initial, multiplier, max),
        }
    }
}

/// How the scheduler handles failed fetches.
///
/// Every failure increments the address's counter. A failure whose count is
/// within `max_retries` is re-fetched; the next one abandons the address.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Number of re-fetches allowed after the first failure.
    pub max_retries: u32,
    /// Delay schedule between a failure and its re-fetch.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Backoff::Immediate)
    }

    /// Whether an address that has failed `failures` times is re-fetched.
    pub fn should_retry(&self, failures: u32) -> bool {
        failures <= self.max_retries
    }

    /// Delay before the re-fetch that follows failure number `failures`.
    ///
    /// Returns `None` when the address has exhausted its retries.
    pub fn delay_for_retry(&self, failures: u32) -> Option<Duration> {
        if self.should_retry(failures) {
            Some(self.backoff.delay(failures))
        } else {
            None
        }
    }
}
