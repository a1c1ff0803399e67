//! Teleop / external offset axis configuration.
//!
//! Loaded from TOML at startup and immutable while motion is running.
//! Axes not listed in `axes` are inactive: they carry no soft limits and
//! never move.
//!
//! ```toml
//! cycle_time_us = 1000
//!
//! [shared]
//! service_name = "mill"
//!
//! [[axes]]
//! letter = "X"
//! min_pos_limit = -200.0
//! max_pos_limit = 200.0
//! vel_limit = 50.0
//! acc_limit = 500.0
//! jerk_limit = 10000.0
//! ext_offset_vel_limit = 5.0
//! ext_offset_acc_limit = 50.0
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig, Validate};
use crate::consts::{CYCLE_TIME_US, CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN, MAX_AXIS, axis_index};

/// Top-level motion core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Settings common to every EVO service.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Servo period in microseconds (default: 1000 = 1ms).
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    /// Active axes. Capacity is bounded by [`MAX_AXIS`].
    #[serde(default)]
    pub axes: heapless::Vec<AxisConfig, MAX_AXIS>,
}

fn default_cycle_time_us() -> u32 {
    CYCLE_TIME_US
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            cycle_time_us: CYCLE_TIME_US,
            axes: heapless::Vec::new(),
        }
    }
}

impl MotionConfig {
    /// Servo period in seconds.
    #[inline]
    pub fn cycle_time_s(&self) -> f64 {
        f64::from(self.cycle_time_us) * 1e-6
    }

    /// Find the configuration for an axis letter.
    pub fn axis(&self, letter: char) -> Option<&AxisConfig> {
        let upper = letter.to_ascii_uppercase();
        self.axes
            .iter()
            .find(|ax| ax.letter.to_ascii_uppercase() == upper)
    }
}

impl Validate for MotionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.cycle_time_us < CYCLE_TIME_US_MIN || self.cycle_time_us > CYCLE_TIME_US_MAX {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            )));
        }
        let mut seen = [false; MAX_AXIS];
        for ax in &self.axes {
            ax.validate()?;
            // validate() guarantees a known letter
            let idx = axis_index(ax.letter).unwrap_or(0);
            if seen[idx] {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate axis letter {}",
                    ax.letter
                )));
            }
            seen[idx] = true;
        }
        Ok(())
    }
}

/// Per-axis limits for teleop jogging and the external offset overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Axis letter (X, Y, Z, A, B, C, U, V, W).
    pub letter: char,

    /// Lower soft position limit [user units].
    pub min_pos_limit: f64,
    /// Upper soft position limit [user units].
    pub max_pos_limit: f64,

    /// Teleop velocity limit [user units/s].
    pub vel_limit: f64,
    /// Teleop acceleration limit [user units/s²].
    pub acc_limit: f64,
    /// Teleop jerk limit [user units/s³]. Zero selects the trapezoidal profile.
    #[serde(default)]
    pub jerk_limit: f64,

    /// External offset velocity limit [user units/s].
    #[serde(default)]
    pub ext_offset_vel_limit: f64,
    /// External offset acceleration limit [user units/s²].
    #[serde(default)]
    pub ext_offset_acc_limit: f64,

    /// Joint index of a locking indexer; disables wheel jogging on this axis.
    #[serde(default)]
    pub locking_joint: Option<u8>,
}

impl Validate for AxisConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if axis_index(self.letter).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "unknown axis letter {:?}",
                self.letter
            )));
        }
        if !(self.min_pos_limit <= self.max_pos_limit) {
            return Err(ConfigError::ValidationError(format!(
                "axis {}: min_pos_limit {} > max_pos_limit {}",
                self.letter, self.min_pos_limit, self.max_pos_limit
            )));
        }
        check_positive(self.letter, "vel_limit", self.vel_limit)?;
        check_positive(self.letter, "acc_limit", self.acc_limit)?;
        check_non_negative(self.letter, "jerk_limit", self.jerk_limit)?;
        check_non_negative(self.letter, "ext_offset_vel_limit", self.ext_offset_vel_limit)?;
        check_non_negative(self.letter, "ext_offset_acc_limit", self.ext_offset_acc_limit)?;
        if self.ext_offset_vel_limit > 0.0 && self.ext_offset_acc_limit <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "axis {}: ext_offset_acc_limit must be > 0 when ext_offset_vel_limit is set",
                self.letter
            )));
        }
        Ok(())
    }
}

fn check_positive(letter: char, name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "axis {letter}: {name} must be > 0 (got {value})"
        )))
    }
}

fn check_non_negative(letter: char, name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "axis {letter}: {name} must be >= 0 (got {value})"
        )))
    }
}
