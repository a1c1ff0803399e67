//! Prelude module for common re-exports.
//!
//! ```rust
//! use evo_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};
pub use crate::motion::{AxisConfig, MotionConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{AXIS_LETTERS, CYCLE_TIME_US, MAX_AXIS, axis_index, axis_letter};
