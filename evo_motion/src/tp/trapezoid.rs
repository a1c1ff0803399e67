//! Trapezoidal velocity-ramp profile (zero jerk).
//!
//! Each cycle asks for the speed from which the remaining error can still
//! be closed at `max_acc`, caps it at the cruise speed, and slews the
//! current velocity toward it by at most `max_acc`.

use super::{AccelState, TRAPEZOID_TINY_FACTOR, TrajectoryPlanner};

impl TrajectoryPlanner {
    pub(super) fn trapezoid_step(&mut self) {
        let max_acc = self.max_acc;
        let tiny = TRAPEZOID_TINY_FACTOR * max_acc;
        let vc = self.cruise_speed();
        let err = self.pos_cmd - self.curr_pos;

        let vel_req = if vc == 0.0 {
            0.0
        } else if err > tiny {
            (-max_acc + (max_acc * max_acc + 2.0 * max_acc * err).sqrt()).min(vc)
        } else if err < -tiny {
            (max_acc - (max_acc * max_acc - 2.0 * max_acc * err).sqrt()).max(-vc)
        } else {
            0.0
        };

        let prev = self.curr_vel;
        let vel = vel_req.clamp(prev - max_acc, prev + max_acc);
        self.curr_acc = vel - prev;
        self.curr_vel = vel;
        self.curr_pos += vel;

        if vel == 0.0 && vel_req == 0.0 {
            self.settle();
        } else if vel.abs() > prev.abs() {
            self.accel_state = AccelState::S1;
        } else if vel.abs() < prev.abs() {
            self.accel_state = AccelState::S5;
        } else if vel.abs() >= vc - tiny {
            self.accel_state = AccelState::S3;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
