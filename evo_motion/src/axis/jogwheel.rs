//! Encoder-wheel jogging.

use super::AxisSet;

impl AxisSet {
    /// Turn jog-wheel count deltas into incremental teleop moves.
    ///
    /// Counts are latched every call so deltas never accumulate while a
    /// guard blocks the wheel. The first call only latches.
    pub fn handle_jogwheels(&mut self, teleop_mode: bool, motion_enabled: bool, homing_active: bool) {
        let first_pass = !self.jogwheels_initialized;
        self.jogwheels_initialized = true;

        for axis in &mut self.axes {
            let input = axis.input;
            let delta = input.jog_counts.wrapping_sub(axis.old_jog_counts);
            axis.old_jog_counts = input.jog_counts;

            if first_pass
                || delta == 0
                || !teleop_mode
                || !motion_enabled
                || !input.jog_enable
                || homing_active
                || axis.kb_jog_active
                || axis.locking_joint.is_some()
            {
                continue;
            }

            let mut target = axis.teleop_tp.pos_cmd + f64::from(delta) * input.jog_scale;
            if input.jog_vel_mode && axis.acc_limit > 0.0 {
                // Never command further than the axis can stop from full speed.
                let stop = axis.vel_limit * axis.vel_limit / (2.0 * axis.acc_limit);
                target = target.clamp(axis.pos_cmd - stop, axis.pos_cmd + stop);
            }
            if !axis.reachable(target) {
                continue;
            }

            axis.arm_teleop(target, axis.vel_limit);
            if axis.teleop_tp.is_active() {
                axis.wheel_jog_active = true;
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::axis::{AxisInput, AxisSet};

    const T: f64 = 0.001;

    fn set() -> AxisSet {
        let mut set = AxisSet::new(T);
        for i in 0..3 {
            set.set_pos_limits(i, -10.0, 10.0).unwrap();
            set.set_vel_limit(i, 10.0).unwrap();
            set.set_acc_limit(i, 100.0).unwrap();
        }
        set
    }

    fn wheel(counts: i32) -> AxisInput {
        AxisInput {
            jog_counts: counts,
            jog_enable: true,
            jog_scale: 0.01,
            ..Default::default()
        }
    }

    fn turn(set: &mut AxisSet, index: usize, counts: i32) {
        set.set_input(index, wheel(counts)).unwrap();
        set.handle_jogwheels(true, true, false);
    }

    #[test]
    fn first_pass_only_latches() {
        let mut set = set();
        turn(&mut set, 0, 500);
        let x = set.get(0).unwrap();
        assert_eq!(x.old_jog_counts, 500);
        assert_eq!(x.teleop_tp.pos_cmd, 0.0);
        assert!(!x.wheel_jog_active);
    }

    #[test]
    fn delta_moves_teleop_target() {
        let mut set = set();
        turn(&mut set, 0, 0);
        turn(&mut set, 0, 100);
        let x = set.get(0).unwrap();
        assert!((x.teleop_tp.pos_cmd - 1.0).abs() < 1e-12);
        assert!(x.wheel_jog_active);
        turn(&mut set, 0, 50);
        assert!((set.get(0).unwrap().teleop_tp.pos_cmd - 0.5).abs() < 1e-12);
    }

    #[test]
    fn counter_wrap_is_a_small_delta() {
        let mut set = set();
        turn(&mut set, 0, i32::MAX);
        turn(&mut set, 0, i32::MIN);
        assert!((set.get(0).unwrap().teleop_tp.pos_cmd - 0.01).abs() < 1e-12);
    }

    #[test]
    fn locking_joint_blocks_wheel() {
        let mut set = set();
        set.set_locking_joint(2, Some(2)).unwrap();
        turn(&mut set, 2, 0);
        turn(&mut set, 2, 300);
        let z = set.get(2).unwrap();
        assert_eq!(z.teleop_tp.pos_cmd, 0.0);
        assert!(!z.wheel_jog_active);
        assert_eq!(z.old_jog_counts, 300);
    }

    #[test]
    fn guards_block_and_counts_do_not_replay() {
        let mut set = set();
        turn(&mut set, 0, 0);
        set.set_input(0, wheel(100)).unwrap();
        set.handle_jogwheels(false, true, false);
        set.set_input(0, wheel(200)).unwrap();
        set.handle_jogwheels(true, false, false);
        set.set_input(0, wheel(300)).unwrap();
        set.handle_jogwheels(true, true, true);
        set.set_input(
            0,
            AxisInput {
                jog_enable: false,
                ..wheel(400)
            },
        )
        .unwrap();
        set.handle_jogwheels(true, true, false);
        assert_eq!(set.get(0).unwrap().teleop_tp.pos_cmd, 0.0);

        // Re-enabled: only the new delta applies.
        turn(&mut set, 0, 410);
        assert!((set.get(0).unwrap().teleop_tp.pos_cmd - 0.1).abs() < 1e-12);
    }

    #[test]
    fn keyboard_jog_has_priority() {
        let mut set = set();
        turn(&mut set, 0, 0);
        set.jog_incremental(0, 1.0, 5.0);
        turn(&mut set, 0, 100);
        assert_eq!(set.get(0).unwrap().teleop_tp.pos_cmd, 1.0);
        assert!(!set.get(0).unwrap().wheel_jog_active);
    }

    #[test]
    fn offset_counts_toward_wheel_limit() {
        let mut set = set();
        set.get_mut(0).unwrap().ext_offset_tp.curr_pos = 9.5;
        turn(&mut set, 0, 0);
        turn(&mut set, 0, 100);
        assert_eq!(set.get(0).unwrap().teleop_tp.pos_cmd, 0.0);
        assert!(!set.get(0).unwrap().wheel_jog_active);

        turn(&mut set, 0, 140);
        assert!((set.get(0).unwrap().teleop_tp.pos_cmd - 0.4).abs() < 1e-12);
    }

    #[test]
    fn target_beyond_limit_is_refused() {
        let mut set = set();
        turn(&mut set, 0, 0);
        turn(&mut set, 0, 1_100);
        assert_eq!(set.get(0).unwrap().teleop_tp.pos_cmd, 0.0);
        // Other axes are still served in the same call.
        set.set_input(0, wheel(2_200)).unwrap();
        set.set_input(1, wheel(100)).unwrap();
        set.handle_jogwheels(true, true, false);
        assert_eq!(set.get(0).unwrap().teleop_tp.pos_cmd, 0.0);
        assert!((set.get(1).unwrap().teleop_tp.pos_cmd - 1.0).abs() < 1e-12);
    }

    #[test]
    fn velocity_mode_clamps_to_stopping_distance() {
        let mut set = set();
        turn(&mut set, 0, 0);
        set.set_input(
            0,
            AxisInput {
                jog_vel_mode: true,
                ..wheel(900)
            },
        )
        .unwrap();
        set.handle_jogwheels(true, true, false);
        // v²/2a = 100 / 200
        assert!((set.get(0).unwrap().teleop_tp.pos_cmd - 0.5).abs() < 1e-12);
    }
}
