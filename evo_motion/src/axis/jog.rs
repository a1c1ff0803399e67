//! Keyboard jogging.
//!
//! Each entry point computes a teleop target, refuses it silently if the
//! target plus the applied external offset lies outside the soft limits,
//! and arms the teleop planner. Requests with no displacement or no speed
//! are no-ops.

use tracing::debug;

use super::{Axis, AxisSet};
use crate::tp::VEL_CMD_EPSILON;

/// Distance used as "forever" for continuous jogs on unlimited axes [units].
pub const UNBOUNDED_JOG_DISTANCE: f64 = 1.0e9;

impl AxisSet {
    /// Jog `index` toward its limit in the direction of `vel` [units/s].
    ///
    /// The teleop target is placed so that teleop plus the applied offset
    /// ends on the limit.
    pub fn jog_continuous(&mut self, index: usize, vel: f64) {
        let Some(axis) = self.axes.get_mut(index) else {
            return;
        };
        if vel.abs() <= VEL_CMD_EPSILON {
            return;
        }
        let offset = axis.ext_offset_tp.curr_pos;
        let target = match axis.limits {
            Some(l) if vel > 0.0 => l.max - offset,
            Some(l) => l.min - offset,
            None => axis.teleop_tp.curr_pos + vel.signum() * UNBOUNDED_JOG_DISTANCE,
        };
        start_kb_jog(axis, target, vel.abs());
    }

    /// Jog `index` by `offset` from its current teleop target.
    pub fn jog_incremental(&mut self, index: usize, offset: f64, vel: f64) {
        let Some(axis) = self.axes.get_mut(index) else {
            return;
        };
        if offset == 0.0 || vel.abs() <= VEL_CMD_EPSILON {
            return;
        }
        let target = axis.teleop_tp.pos_cmd + offset;
        start_kb_jog(axis, target, vel.abs());
    }

    /// Jog `index` to the absolute position `pos`.
    pub fn jog_absolute(&mut self, index: usize, pos: f64, vel: f64) {
        let Some(axis) = self.axes.get_mut(index) else {
            return;
        };
        if pos == axis.teleop_tp.pos_cmd || vel.abs() <= VEL_CMD_EPSILON {
            return;
        }
        start_kb_jog(axis, pos, vel.abs());
    }

    /// Stop the teleop planner of `index`. Returns whether a jog was running.
    pub fn jog_abort(&mut self, index: usize, immediate: bool) -> bool {
        self.axes
            .get_mut(index)
            .is_some_and(|axis| abort_axis(axis, immediate))
    }

    /// Stop every axis. Returns whether any jog was running.
    pub fn jog_abort_all(&mut self, immediate: bool) -> bool {
        let mut any = false;
        for axis in &mut self.axes {
            any |= abort_axis(axis, immediate);
        }
        any
    }

    /// Any keyboard or wheel jog in progress.
    pub fn jog_is_active(&self) -> bool {
        self.axes
            .iter()
            .any(|axis| axis.kb_jog_active || axis.wheel_jog_active)
    }
}

fn start_kb_jog(axis: &mut Axis, target: f64, vel: f64) {
    if axis.wheel_jog_active {
        debug!(axis = %axis.letter, "keyboard jog refused: wheel jog active");
        return;
    }
    if !axis.reachable(target) {
        debug!(
            axis = %axis.letter,
            target,
            offset = axis.ext_offset_tp.curr_pos,
            "keyboard jog refused: beyond soft limit"
        );
        return;
    }
    axis.arm_teleop(target, vel);
    if axis.teleop_tp.is_active() {
        axis.kb_jog_active = true;
    }
}

fn abort_axis(axis: &mut Axis, immediate: bool) -> bool {
    let was_active = axis.kb_jog_active || axis.wheel_jog_active;
    axis.teleop_tp.jog_abort(immediate);
    axis.kb_jog_active = false;
    axis.wheel_jog_active = false;
    was_active
}

// ─── Tests ──────────────────────────────────────────────────────────
