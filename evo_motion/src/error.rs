//! Error types for axis configuration and servo thread setup.
//!
//! Only configuration-time setters and thread setup return errors. The
//! per-cycle path reports limit violations as boolean flags.

use evo_common::config::ConfigError;
use thiserror::Error;

/// Errors returned by [`crate::axis::AxisSet`] setters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AxisError {
    /// Axis index outside `0..MAX_AXIS`
    #[error("Unknown axis index: {index}")]
    UnknownAxis {
        /// Requested index
        index: usize,
    },

    /// Soft limits with `min > max`
    #[error("Invalid soft limits on axis {index}: min {min} > max {max}")]
    InvalidLimit {
        /// Axis index
        index: usize,
        /// Lower limit
        min: f64,
        /// Upper limit
        max: f64,
    },

    /// Kinematic parameter negative or not finite
    #[error("Invalid {name} on axis {index}: {value}")]
    InvalidParameter {
        /// Axis index
        index: usize,
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },
}

/// Errors raised while bringing up the motion core from a config file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Axis(#[from] AxisError),
}

/// Errors from servo thread placement or paced execution.
#[derive(Error, Debug)]
pub enum CycleError {
    /// An RT system call was refused
    #[error("RT setup failed at {step}: {source}")]
    RtSetup {
        /// System call that failed
        step: &'static str,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// A paced tick ran past the servo period (fatal with `rt` only)
    #[error("Servo tick took {tick_ns}ns, period is {period_ns}ns")]
    Overrun {
        /// Tick body duration
        tick_ns: u64,
        /// Servo period
        period_ns: u64,
    },
}

impl CycleError {
    #[cfg_attr(not(feature = "rt"), allow(dead_code))]
    pub(crate) fn rt(step: &'static str, source: std::io::Error) -> Self {
        Self::RtSetup { step, source }
    }
}
