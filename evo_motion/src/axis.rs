//! Axis coordination layer.
//!
//! An [`AxisSet`] owns one [`Axis`] per axis letter. Each axis carries two
//! independent planners: `teleop_tp` for jogged and teleoperated motion and
//! `ext_offset_tp` for the additive external offset overlay. The servo loop
//! calls, once per cycle and in this order:
//!
//! 1. [`AxisSet::plan_external_offsets`]
//! 2. [`AxisSet::handle_jogwheels`]
//! 3. [`AxisSet::update_coord_with_bound`]
//! 4. [`AxisSet::calc_motion`]
//!
//! Nothing here allocates or blocks. Soft-limit violations are recovered
//! by clamping and reported as booleans.

pub mod jog;
pub mod jogwheel;
pub mod limits;
pub mod motion;
pub mod offset;

use bitflags::bitflags;
use evo_common::consts::{AXIS_LETTERS, MAX_AXIS};

use crate::error::AxisError;
use crate::tp::TrajectoryPlanner;

pub use limits::LimitSide;

/// One position per axis, indexed like [`AxisSet`].
pub type CoordPositions = [f64; MAX_AXIS];

// ─── Limits ─────────────────────────────────────────────────────────

/// Soft position limits of an axis in the active coordinate set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionLimits {
    /// Lowest allowed commanded position.
    pub min: f64,
    /// Highest allowed commanded position.
    pub max: f64,
}

impl PositionLimits {
    #[inline]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive range check.
    #[inline]
    pub fn contains(&self, pos: f64) -> bool {
        pos >= self.min && pos <= self.max
    }
}

// ─── Per-cycle I/O ──────────────────────────────────────────────────

/// Raw per-cycle inputs of one axis.
///
/// Counters are free-running and may wrap; only deltas are used.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisInput {
    /// Jog-wheel encoder counter.
    pub jog_counts: i32,
    /// Wheel jogging allowed on this axis.
    pub jog_enable: bool,
    /// Distance per wheel count [units].
    pub jog_scale: f64,
    /// Clamp wheel targets to the stopping distance from the command.
    pub jog_vel_mode: bool,
    /// External offset counter.
    pub eoffset_counts: i32,
    /// Offset counts are consumed only while set.
    pub eoffset_enable: bool,
    /// Offset distance per count [units].
    pub eoffset_scale: f64,
    /// Drive the offset back to zero.
    pub eoffset_clear: bool,
}

bitflags! {
    /// Per-axis status bits exported every cycle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AxisStatusFlags: u8 {
        /// Keyboard jog owns the teleop planner.
        const KB_JOG            = 0x01;
        /// Jog wheel owns the teleop planner.
        const WHEEL_JOG         = 0x02;
        /// Teleop planner is moving or has distance to go.
        const TELEOP_ACTIVE     = 0x04;
        /// A non-negligible external offset is applied.
        const EXT_OFFSET_ACTIVE = 0x08;
        /// A soft limit clamped this axis during the last cycle.
        const LIMIT_CLAMPED     = 0x10;
    }
}

/// Outbound snapshot of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisStatus {
    /// Commanded position including the external offset.
    pub pos_cmd: f64,
    /// Teleop planner position.
    pub teleop_pos: f64,
    /// [units/s]
    pub teleop_vel: f64,
    /// Requested external offset.
    pub ext_offset_req: f64,
    /// Applied external offset.
    pub ext_offset: f64,
    /// Jog ownership, activity and clamp bits.
    pub flags: AxisStatusFlags,
}

// ─── Axis ───────────────────────────────────────────────────────────

/// One machine axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    /// Axis letter from [`AXIS_LETTERS`].
    pub letter: char,
    /// Teleop commanded position (without external offset).
    pub pos_cmd: f64,
    /// Teleop velocity of the last cycle [units/s].
    pub teleop_vel_cmd: f64,
    /// `None` when the axis is not part of the active coordinate set.
    pub limits: Option<PositionLimits>,
    /// [units/s]
    pub vel_limit: f64,
    /// [units/s²]
    pub acc_limit: f64,
    /// [units/s³]; zero selects the trapezoid.
    pub jerk_limit: f64,
    /// Planner for keyboard, wheel and teleop motion.
    pub teleop_tp: TrajectoryPlanner,
    /// Planner for the external offset overlay (always trapezoidal).
    pub ext_offset_tp: TrajectoryPlanner,
    /// [units/s]
    pub ext_offset_vel_limit: f64,
    /// [units/s²]
    pub ext_offset_acc_limit: f64,
    /// A keyboard jog owns `teleop_tp`.
    pub kb_jog_active: bool,
    /// A wheel jog owns `teleop_tp`.
    pub wheel_jog_active: bool,
    /// Indexer joint; wheel jogging is refused while set.
    pub locking_joint: Option<u8>,
    /// Wheel counter latched on the previous cycle.
    pub old_jog_counts: i32,
    /// Offset counter latched on the previous cycle.
    pub old_offset_counts: i32,
    /// Latest inputs, set by the caller before each cycle.
    pub input: AxisInput,
    /// Clamped by `update_coord_with_bound` this cycle.
    pub offset_clamped: bool,
    /// Clamped by `calc_motion` this cycle.
    pub teleop_clamped: bool,
}

impl Axis {
    /// Inactive axis at the origin with no limits.
    pub const fn new(letter: char) -> Self {
        Self {
            letter,
            pos_cmd: 0.0,
            teleop_vel_cmd: 0.0,
            limits: None,
            vel_limit: 0.0,
            acc_limit: 0.0,
            jerk_limit: 0.0,
            teleop_tp: TrajectoryPlanner::new(),
            ext_offset_tp: TrajectoryPlanner::new(),
            ext_offset_vel_limit: 0.0,
            ext_offset_acc_limit: 0.0,
            kb_jog_active: false,
            wheel_jog_active: false,
            locking_joint: None,
            old_jog_counts: 0,
            old_offset_counts: 0,
            input: AxisInput {
                jog_counts: 0,
                jog_enable: false,
                jog_scale: 0.0,
                jog_vel_mode: false,
                eoffset_counts: 0,
                eoffset_enable: false,
                eoffset_scale: 0.0,
                eoffset_clear: false,
            },
            offset_clamped: false,
            teleop_clamped: false,
        }
    }

    /// Arm the teleop planner toward `target` at `vel` with the axis limits.
    #[inline]
    pub(crate) fn arm_teleop(&mut self, target: f64, vel: f64) {
        self.teleop_tp
            .jog_continuous(target, vel, self.vel_limit, self.acc_limit, self.jerk_limit);
    }

    /// Arm the offset planner toward `target` (trapezoidal profile).
    #[inline]
    pub(crate) fn arm_offset(&mut self, target: f64) {
        self.ext_offset_tp.jog_continuous(
            target,
            self.ext_offset_vel_limit,
            self.ext_offset_vel_limit,
            self.ext_offset_acc_limit,
            0.0,
        );
    }

    /// Does teleop `target` plus the applied offset lie within the limits?
    #[inline]
    pub fn reachable(&self, target: f64) -> bool {
        self.limits
            .is_none_or(|limits| limits.contains(target + self.ext_offset_tp.curr_pos))
    }

    /// Offset magnitude below which the overlay counts as zero [units].
    #[inline]
    pub fn ext_offset_epsilon(&self, period: f64) -> f64 {
        crate::tp::TRAPEZOID_TINY_FACTOR * self.ext_offset_acc_limit * period * period
    }

    pub fn status(&self, period: f64) -> AxisStatus {
        let mut flags = AxisStatusFlags::empty();
        flags.set(AxisStatusFlags::KB_JOG, self.kb_jog_active);
        flags.set(AxisStatusFlags::WHEEL_JOG, self.wheel_jog_active);
        flags.set(AxisStatusFlags::TELEOP_ACTIVE, self.teleop_tp.is_active());
        flags.set(
            AxisStatusFlags::EXT_OFFSET_ACTIVE,
            self.ext_offset_tp.curr_pos.abs() > self.ext_offset_epsilon(period),
        );
        flags.set(
            AxisStatusFlags::LIMIT_CLAMPED,
            self.offset_clamped || self.teleop_clamped,
        );
        AxisStatus {
            pos_cmd: self.pos_cmd + self.ext_offset_tp.curr_pos,
            teleop_pos: self.teleop_tp.curr_pos,
            teleop_vel: self.teleop_vel_cmd,
            ext_offset_req: self.ext_offset_tp.pos_cmd,
            ext_offset: self.ext_offset_tp.curr_pos,
            flags,
        }
    }
}

// ─── AxisSet ────────────────────────────────────────────────────────

/// All axes of the machine, indexed by position in [`AXIS_LETTERS`].
#[derive(Debug, Clone)]
pub struct AxisSet {
    axes: [Axis; MAX_AXIS],
    cycle_time: f64,
    /// First `handle_jogwheels` call done.
    jogwheels_initialized: bool,
    /// First `plan_external_offsets` call done.
    offsets_initialized: bool,
}

impl AxisSet {
    /// Create all axes, inactive, with planners set to `cycle_time` [s].
    pub fn new(cycle_time: f64) -> Self {
        let mut axes = AXIS_LETTERS.map(Axis::new);
        for axis in &mut axes {
            axis.teleop_tp.set_cycle_time(cycle_time);
            axis.ext_offset_tp.set_cycle_time(cycle_time);
        }
        Self {
            axes,
            cycle_time,
            jogwheels_initialized: false,
            offsets_initialized: false,
        }
    }

    /// Servo period [s].
    #[inline]
    pub fn cycle_time(&self) -> f64 {
        self.cycle_time
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Axis> {
        self.axes.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Axis> {
        self.axes.get_mut(index)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter()
    }

    /// Set the inputs `index` will see on the next cycle.
    pub fn set_input(&mut self, index: usize, input: AxisInput) -> Result<(), AxisError> {
        self.axis_mut(index)?.input = input;
        Ok(())
    }

    pub fn status(&self, index: usize) -> Option<AxisStatus> {
        self.get(index).map(|axis| axis.status(self.cycle_time))
    }

    /// Teleop commanded positions (without offsets).
    pub fn pos_cmds(&self) -> CoordPositions {
        self.axes.map(|axis| axis.pos_cmd)
    }

    fn axis_mut(&mut self, index: usize) -> Result<&mut Axis, AxisError> {
        self.axes
            .get_mut(index)
            .ok_or(AxisError::UnknownAxis { index })
    }

    // ─── Configuration setters ──────────────────────────────────────

    /// Put the axis in the active coordinate set with `[min, max]` limits.
    pub fn set_pos_limits(&mut self, index: usize, min: f64, max: f64) -> Result<(), AxisError> {
        let axis = self.axis_mut(index)?;
        if !(min <= max) {
            return Err(AxisError::InvalidLimit { index, min, max });
        }
        axis.limits = Some(PositionLimits::new(min, max));
        Ok(())
    }

    /// Set the lower limit; an inactive axis becomes active, unbounded above.
    pub fn set_min_pos_limit(&mut self, index: usize, value: f64) -> Result<(), AxisError> {
        let max = self
            .get(index)
            .and_then(|axis| axis.limits)
            .map_or(f64::INFINITY, |l| l.max);
        self.set_pos_limits(index, value, max)
    }

    /// Set the upper limit; an inactive axis becomes active, unbounded below.
    pub fn set_max_pos_limit(&mut self, index: usize, value: f64) -> Result<(), AxisError> {
        let min = self
            .get(index)
            .and_then(|axis| axis.limits)
            .map_or(f64::NEG_INFINITY, |l| l.min);
        self.set_pos_limits(index, min, value)
    }

    /// Remove the axis from the active coordinate set.
    pub fn clear_pos_limits(&mut self, index: usize) -> Result<(), AxisError> {
        self.axis_mut(index)?.limits = None;
        Ok(())
    }

    pub fn set_vel_limit(&mut self, index: usize, value: f64) -> Result<(), AxisError> {
        self.axis_mut(index)?.vel_limit = check(index, "vel_limit", value)?;
        Ok(())
    }

    pub fn set_acc_limit(&mut self, index: usize, value: f64) -> Result<(), AxisError> {
        self.axis_mut(index)?.acc_limit = check(index, "acc_limit", value)?;
        Ok(())
    }

    pub fn set_jerk_limit(&mut self, index: usize, value: f64) -> Result<(), AxisError> {
        self.axis_mut(index)?.jerk_limit = check(index, "jerk_limit", value)?;
        Ok(())
    }

    pub fn set_ext_offset_vel_limit(&mut self, index: usize, value: f64) -> Result<(), AxisError> {
        self.axis_mut(index)?.ext_offset_vel_limit = check(index, "ext_offset_vel_limit", value)?;
        Ok(())
    }

    pub fn set_ext_offset_acc_limit(&mut self, index: usize, value: f64) -> Result<(), AxisError> {
        self.axis_mut(index)?.ext_offset_acc_limit = check(index, "ext_offset_acc_limit", value)?;
        Ok(())
    }

    pub fn set_locking_joint(&mut self, index: usize, joint: Option<u8>) -> Result<(), AxisError> {
        self.axis_mut(index)?.locking_joint = joint;
        Ok(())
    }
}

fn check(index: usize, name: &'static str, value: f64) -> Result<f64, AxisError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AxisError::InvalidParameter { index, name, value })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
