//! Teleop motion: per-cycle planner advance with soft-limit enforcement,
//! compound velocity, and synchronisation with coordinate positions.

use super::{AxisSet, CoordPositions};

impl AxisSet {
    /// Advance every teleop planner one cycle.
    ///
    /// The sum of teleop and applied external offset is checked against
    /// the soft limits. A crossing pins the teleop planner so the sum sits
    /// exactly on the limit, with zero velocity. A target on or beyond the
    /// pinned position can no longer be reached, so the jog ends there;
    /// otherwise the planner re-plans from rest toward it. Returns whether
    /// any axis was clamped this cycle.
    pub fn calc_motion(&mut self, period: f64) -> bool {
        let mut violated = false;
        for axis in &mut self.axes {
            axis.teleop_tp.update(period);
            axis.teleop_clamped = false;

            let offset = axis.ext_offset_tp.curr_pos;
            if let Some(limits) = axis.limits {
                let total = axis.teleop_tp.curr_pos + offset;
                let pinned = if total > limits.max {
                    Some((limits.max, 1.0))
                } else if total < limits.min {
                    Some((limits.min, -1.0))
                } else {
                    None
                };
                if let Some((limit, side)) = pinned {
                    let hold = limit - offset;
                    if side * (axis.teleop_tp.pos_cmd - hold) >= 0.0 {
                        axis.teleop_tp.reset_to(hold);
                    } else {
                        axis.teleop_tp.hold_at(hold);
                    }
                    axis.teleop_clamped = true;
                    violated = true;
                }
            }

            axis.pos_cmd = axis.teleop_tp.curr_pos;
            axis.teleop_vel_cmd = axis.teleop_tp.velocity();
            if !axis.teleop_tp.is_active() {
                axis.kb_jog_active = false;
                axis.wheel_jog_active = false;
            }
        }
        violated
    }

    /// Magnitude of the combined teleop velocity of all moving axes [units/s].
    pub fn compound_velocity(&self) -> f64 {
        self.axes
            .iter()
            .filter(|axis| axis.teleop_tp.is_active())
            .map(|axis| axis.teleop_tp.velocity().powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Seed every teleop planner from coordinate positions, with the
    /// applied external offsets removed. Used when entering teleop.
    pub fn sync_teleop_tp_to_coord(&mut self, positions: &CoordPositions) {
        for (axis, &pos) in self.axes.iter_mut().zip(positions.iter()) {
            let base = pos - axis.ext_offset_tp.curr_pos;
            axis.teleop_tp.reset_to(base);
            axis.pos_cmd = base;
            axis.teleop_vel_cmd = 0.0;
        }
    }

    /// Write `teleop + offset` of every axis into `positions`.
    pub fn sync_coord_to_teleop_tp(&self, positions: &mut CoordPositions) {
        for (pos, axis) in positions.iter_mut().zip(self.axes.iter()) {
            *pos = axis.teleop_tp.curr_pos + axis.ext_offset_tp.curr_pos;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::axis::AxisSet;
    use evo_common::consts::MAX_AXIS;

    const T: f64 = 0.001;

    fn set() -> AxisSet {
        let mut set = AxisSet::new(T);
        for i in 0..2 {
            set.set_pos_limits(i, -10.0, 10.0).unwrap();
            set.set_vel_limit(i, 10.0).unwrap();
            set.set_acc_limit(i, 100.0).unwrap();
        }
        set
    }

    #[test]
    fn jog_runs_to_completion_and_clears_flag() {
        let mut set = set();
        set.jog_incremental(0, 1.0, 10.0);
        for _ in 0..1_000 {
            assert!(!set.calc_motion(T));
        }
        let x = set.get(0).unwrap();
        assert!((x.pos_cmd - 1.0).abs() < 1e-6);
        assert_eq!(x.teleop_vel_cmd, 0.0);
        assert!(!x.kb_jog_active);
        assert!(!set.jog_is_active());
    }

    #[test]
    fn crossing_limit_pins_exactly_and_ends_the_move() {
        let mut set = set();
        let tp = &mut set.get_mut(0).unwrap().teleop_tp;
        tp.reset_to(9.0);
        tp.jog_continuous(10.5, 10.0, 10.0, 100.0, 0.0);
        let mut clamps = 0;
        for _ in 0..1_000 {
            if set.calc_motion(T) {
                clamps += 1;
                let x = set.get(0).unwrap();
                assert_eq!(x.pos_cmd, 10.0);
                assert_eq!(x.teleop_tp.curr_vel, 0.0);
                assert!(x.teleop_clamped);
            }
            assert!(set.get(0).unwrap().pos_cmd <= 10.0);
        }
        assert_eq!(clamps, 1);
        let x = set.get(0).unwrap();
        assert_eq!(x.pos_cmd, 10.0);
        assert_eq!(x.teleop_tp.pos_cmd, 10.0);
        assert!(!x.teleop_tp.is_active());
    }

    #[test]
    fn limit_check_includes_external_offset() {
        let mut set = set();
        set.get_mut(0).unwrap().ext_offset_tp.curr_pos = 2.0;

        // 9 + 2 is beyond the limit: refused when armed.
        set.jog_incremental(0, 9.0, 10.0);
        assert!(!set.jog_is_active());

        // 7 + 2 is fine until the offset grows under the moving jog.
        set.jog_incremental(0, 7.0, 10.0);
        assert!(set.jog_is_active());
        for _ in 0..300 {
            assert!(!set.calc_motion(T));
        }
        set.get_mut(0).unwrap().ext_offset_tp.curr_pos = 4.0;

        let mut clamps = 0;
        for _ in 0..20_000 {
            if set.calc_motion(T) {
                clamps += 1;
            }
        }
        assert_eq!(clamps, 1);
        let x = set.get(0).unwrap();
        assert_eq!(x.pos_cmd, 6.0);
        assert_eq!(x.pos_cmd + x.ext_offset_tp.curr_pos, 10.0);
        assert!(!x.kb_jog_active);
        assert!(!x.teleop_tp.is_active());
        assert!(!set.jog_is_active());
    }

    #[test]
    fn pinned_planner_with_reachable_target_keeps_going() {
        let mut set = set();
        {
            let x = set.get_mut(0).unwrap();
            x.teleop_tp.reset_to(9.5);
            x.ext_offset_tp.curr_pos = 1.0;
            x.teleop_tp.jog_continuous(5.0, 10.0, 10.0, 100.0, 0.0);
        }
        // 9.5 + 1 starts beyond the limit; the target lies back inside.
        assert!(set.calc_motion(T));
        let x = set.get(0).unwrap();
        assert_eq!(x.pos_cmd, 9.0);
        assert_eq!(x.teleop_tp.pos_cmd, 5.0);
        assert!(x.teleop_tp.is_active());

        for _ in 0..2_000 {
            assert!(!set.calc_motion(T));
        }
        assert!((set.get(0).unwrap().pos_cmd - 5.0).abs() < 1e-6);
        assert!(!set.get(0).unwrap().teleop_tp.is_active());
    }

    #[test]
    fn compound_velocity_is_euclidean() {
        let mut set = set();
        for (i, v) in [(0, 3.0), (1, 4.0)] {
            let tp = &mut set.get_mut(i).unwrap().teleop_tp;
            tp.jog_continuous(5.0, v, 10.0, 100.0, 0.0);
            tp.curr_vel = v * T;
        }
        assert!((set.compound_velocity() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn sync_round_trip_removes_and_restores_offset() {
        let mut set = set();
        set.get_mut(0).unwrap().ext_offset_tp.curr_pos = 0.5;
        let mut coord = [0.0; MAX_AXIS];
        coord[0] = 3.0;
        coord[1] = -2.0;
        set.sync_teleop_tp_to_coord(&coord);
        let x = set.get(0).unwrap();
        assert_eq!(x.teleop_tp.curr_pos, 2.5);
        assert_eq!(x.teleop_tp.pos_cmd, 2.5);
        assert_eq!(x.pos_cmd, 2.5);

        let mut back = [0.0; MAX_AXIS];
        set.sync_coord_to_teleop_tp(&mut back);
        assert_eq!(back, coord);
    }
}
