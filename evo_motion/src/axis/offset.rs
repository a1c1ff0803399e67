//! External position offsets.
//!
//! The offset planner of each axis runs a trapezoidal profile toward an
//! offset request built from counter deltas. Its position is added to the
//! base coordinate command; a sum that would cross a soft limit is pinned
//! to the limit and the offset is rolled back to match.

use super::{AxisSet, CoordPositions};
use evo_common::consts::MAX_AXIS;

impl AxisSet {
    /// Consume offset counter deltas into offset requests.
    ///
    /// Returns whether any axis had a non-negligible applied offset at the
    /// start of the call.
    pub fn plan_external_offsets(&mut self, period: f64, motion_enabled: bool, all_homed: bool) -> bool {
        let first_pass = !self.offsets_initialized;
        self.offsets_initialized = true;
        let mut applied = false;

        for axis in &mut self.axes {
            axis.ext_offset_tp.enable();
            let input = axis.input;
            if first_pass {
                axis.old_offset_counts = input.eoffset_counts;
                axis.ext_offset_tp.pos_cmd = 0.0;
                continue;
            }

            if axis.ext_offset_tp.curr_pos.abs() > axis.ext_offset_epsilon(period) {
                applied = true;
            }

            let delta = input.eoffset_counts.wrapping_sub(axis.old_offset_counts);
            axis.old_offset_counts = input.eoffset_counts;

            if !all_homed || !motion_enabled {
                continue;
            }
            if input.eoffset_clear {
                axis.arm_offset(0.0);
                axis.ext_offset_tp.pos_cmd = 0.0;
                continue;
            }
            if !input.eoffset_enable || delta == 0 {
                continue;
            }
            let target = axis.ext_offset_tp.pos_cmd + f64::from(delta) * input.eoffset_scale;
            axis.arm_offset(target);
        }
        applied
    }

    /// Advance every offset planner and add the offsets to `positions`.
    ///
    /// A limited axis whose sum crosses a limit is pinned exactly at the
    /// limit, its offset reset to `limit - base` with zero velocity, and its
    /// offset request restored to the pre-cycle value. Returns whether any
    /// axis was clamped.
    pub fn update_coord_with_bound(&mut self, positions: &mut CoordPositions, period: f64) -> bool {
        let base = *positions;
        let mut saved_request = [0.0; MAX_AXIS];
        for (axis, saved) in self.axes.iter_mut().zip(saved_request.iter_mut()) {
            *saved = axis.ext_offset_tp.pos_cmd;
            axis.ext_offset_tp.update(period);
            axis.offset_clamped = false;
        }

        self.apply_ext_offsets(1.0, positions);

        let mut violated = false;
        for (i, axis) in self.axes.iter_mut().enumerate() {
            let Some(limits) = axis.limits else {
                continue;
            };
            if axis.ext_offset_tp.curr_pos == 0.0 {
                continue;
            }
            let pinned = if positions[i] > limits.max {
                limits.max
            } else if positions[i] < limits.min {
                limits.min
            } else {
                continue;
            };
            positions[i] = pinned;
            axis.ext_offset_tp.hold_at(pinned - base[i]);
            axis.ext_offset_tp.pos_cmd = saved_request[i];
            axis.offset_clamped = true;
            violated = true;
        }
        violated
    }

    /// Add (`sign = 1`) or remove (`sign = -1`) the applied offsets.
    pub fn apply_ext_offsets(&self, sign: f64, positions: &mut CoordPositions) {
        for (pos, axis) in positions.iter_mut().zip(self.axes.iter()) {
            *pos += sign * axis.ext_offset_tp.curr_pos;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
