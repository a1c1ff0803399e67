//! # EVO Motion Library
//!
//! Teleop and external-offset motion core for up to nine CNC axes.
//!
//! ## Layers
//!
//! 1. **`tp`**: single-axis trajectory planner. Jerk-limited seven-phase
//!    S-curve, or a velocity-ramp trapezoid when the jerk limit is zero.
//! 2. **`axis`**: per-axis teleop and offset planners, keyboard and wheel
//!    jogging, soft-limit clamping with rollback.
//! 3. **`cycle`**: one servo tick in the required order, timing
//!    statistics and RT thread setup.
//!
//! ## Zero-Allocation Servo Path
//!
//! All axis state lives in fixed-size arrays. Nothing reachable from
//! [`cycle::MotionCycle::tick`] allocates, blocks or returns an error;
//! limit violations come back as booleans and status flags.

pub mod axis;
pub mod config;
pub mod cycle;
pub mod error;
pub mod tp;

pub use axis::{AxisInput, AxisSet, AxisStatus, AxisStatusFlags, LimitSide, PositionLimits};
pub use cycle::{MachineInputs, MotionCycle, RtPlacement, ServoStats};
pub use error::{AxisError, CycleError, SetupError};
pub use tp::{AccelState, TrajectoryPlanner};
