//! Jerk-limited S-curve state machine.
//!
//! Work happens in the frame of the current direction of travel, so every
//! state sees non-negative target distance and velocity. Approach states
//! (S0..S3) take a step only if the state after the step can still stop
//! before the target; otherwise they hand over to the brake states
//! (S4..S6), which decelerate to `brake_to` along the fastest jerk-limited
//! path and re-plan once there.
//!
//! Braking starts on a conservative look-ahead, so a move ends at rest a
//! little short of the target. Short moves from rest, that remainder
//! included, run as a [`FineMove`] whose jerk is reduced until its four
//! phases span exactly the distance left.

use super::kinematics::{Kinematic, segment, stopping_distance, time_to_velocity};
use super::{AccelState, TrajectoryPlanner, Transition};

/// Rest-to-rest move over an exact distance with a reduced jerk.
///
/// Jerk runs `+j, -j, -j, +j` for `phase` cycles each. That covers
/// `2·j·phase³` and ends with zero velocity and acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct FineMove {
    /// Direction of travel (±1).
    dir: f64,
    /// Reduced jerk magnitude [units/cycle³].
    jerk: f64,
    /// Cycles per jerk phase.
    phase: u32,
    /// Cycles run so far.
    elapsed: u32,
    /// Landing position.
    target: f64,
}

impl TrajectoryPlanner {
    /// Evaluate the current state once.
    pub(super) fn transition(&mut self) -> Transition {
        if let Some(fine) = self.fine {
            return self.fine_step(fine);
        }
        match self.accel_state {
            AccelState::Idle => Transition::Settled,
            AccelState::S4 | AccelState::S5 | AccelState::S6 => self.brake_step(),
            AccelState::S0 | AccelState::S1 | AccelState::S2 | AccelState::S3 => {
                self.approach_step()
            }
        }
    }

    #[inline]
    fn tiny(&self) -> f64 {
        self.jerk * 1e-9
    }

    /// Speed reached if acceleration is ramped to zero from here, bounded
    /// from above for the discrete ramp.
    #[inline]
    fn settle_velocity(&self, vel: f64, acc: f64) -> f64 {
        let ramp = 0.5 * acc * acc / self.jerk;
        if acc > 0.0 { vel + ramp + 0.125 * self.jerk } else { vel - ramp }
    }

    /// Can `next` still stop within `dist` of the step origin?
    ///
    /// Keeps one cycle of travel plus `2·J` in reserve for the quantised
    /// start of braking.
    fn can_stop(&self, next: Kinematic, dist: f64) -> bool {
        let remaining = dist - next.pos;
        let reserve = next.vel.max(0.0) + 2.0 * self.jerk;
        remaining >= 0.0
            && stopping_distance(next.vel, next.acc, self.max_acc, self.jerk) + reserve <= remaining
    }

    /// Commit a frame-local step.
    #[inline]
    fn apply(&mut self, next: Kinematic, dir: f64) {
        self.curr_pos += dir * next.pos;
        self.curr_vel = dir * next.vel;
        self.curr_acc = dir * next.acc;
    }

    fn begin_brake(&mut self, to_speed: f64) -> Transition {
        self.brake_dir = if self.curr_vel != 0.0 {
            self.curr_vel.signum()
        } else if self.curr_acc != 0.0 {
            self.curr_acc.signum()
        } else {
            1.0
        };
        self.brake_to = to_speed;
        self.accel_state = AccelState::S4;
        Transition::Rerun
    }

    fn approach_step(&mut self) -> Transition {
        let diff = self.pos_cmd - self.curr_pos;
        let dir = if diff != 0.0 {
            diff.signum()
        } else if self.curr_vel != 0.0 {
            self.curr_vel.signum()
        } else {
            1.0
        };
        let dist = diff.abs();
        let here = Kinematic::new(0.0, dir * self.curr_vel, dir * self.curr_acc);
        let (jerk, max_acc, tiny) = (self.jerk, self.max_acc, self.tiny());
        let at_rest = here.vel.abs() <= tiny && here.acc.abs() <= tiny;

        // Stop request, or moving away from the target.
        let vc = self.cruise_speed();
        if vc == 0.0 || here.vel < -tiny || (here.vel <= tiny && here.acc < -tiny) {
            return self.begin_brake(0.0);
        }

        match self.accel_state {
            AccelState::S0 | AccelState::S1 => {
                if at_rest && self.triangle_fits(dist) {
                    return self.stop_or_finish(true, dir, dist);
                }
                let j = (max_acc - here.acc).clamp(0.0, jerk);
                let next = here.step(j);
                if self.settle_velocity(next.vel, next.acc) > vc {
                    self.accel_state = AccelState::S2;
                    return Transition::Rerun;
                }
                if !self.can_stop(next, dist) {
                    return self.stop_or_finish(at_rest, dir, dist);
                }
                self.apply(next, dir);
                self.accel_state = if next.acc >= max_acc - tiny {
                    AccelState::S1
                } else {
                    AccelState::S0
                };
                Transition::Settled
            }
            AccelState::S2 => {
                let j = (-here.acc).clamp(-jerk, jerk);
                let mut next = here.step(j);
                if !self.can_stop(next, dist) {
                    return self.stop_or_finish(at_rest, dir, dist);
                }
                if next.acc.abs() <= tiny {
                    next.acc = 0.0;
                    self.accel_state = AccelState::S3;
                }
                self.apply(next, dir);
                Transition::Settled
            }
            _ => {
                if here.acc.abs() > tiny {
                    self.accel_state = AccelState::S2;
                    return Transition::Rerun;
                }
                if here.vel < vc - 2.0 * jerk {
                    self.accel_state = AccelState::S0;
                    return Transition::Rerun;
                }
                if here.vel > vc + 2.0 * jerk {
                    return self.begin_brake(vc);
                }
                let next = here.step(0.0);
                if !self.can_stop(next, dist) {
                    return self.begin_brake(0.0);
                }
                self.apply(next, dir);
                Transition::Settled
            }
        }
    }

    /// From rest, a short remainder is finished with a [`FineMove`].
    /// Otherwise brake first.
    fn stop_or_finish(&mut self, at_rest: bool, dir: f64, dist: f64) -> Transition {
        if !at_rest {
            return self.begin_brake(0.0);
        }
        if dist <= self.pos_epsilon() {
            self.land();
            return Transition::Settled;
        }
        self.begin_fine(dir, dist)
    }

    /// Does a full-jerk move over `dist` stay below the acceleration and
    /// speed limits without a hold phase?
    fn triangle_fits(&self, dist: f64) -> bool {
        let n = (dist / (2.0 * self.jerk)).cbrt().ceil().max(1.0);
        dist <= 2.0 * self.max_acc * n * n && dist <= 2.0 * self.cruise_speed() * n
    }

    /// Plan a [`FineMove`] over `dist` from rest.
    ///
    /// The phase length is the shortest whose jerk, peak acceleration
    /// (`dist / 2n²`) and peak velocity (`dist / 2n`) fit the limits.
    fn begin_fine(&mut self, dir: f64, dist: f64) -> Transition {
        let (jerk, max_acc, vc) = (self.jerk, self.max_acc, self.cruise_speed());
        if max_acc <= 0.0 || vc <= 0.0 {
            self.settle();
            return Transition::Settled;
        }

        let fits = |n: f64| {
            dist <= 2.0 * jerk * n * n * n && dist <= 2.0 * max_acc * n * n && dist <= 2.0 * vc * n
        };
        let mut n = (dist / (2.0 * jerk))
            .cbrt()
            .max((dist / (2.0 * max_acc)).sqrt())
            .max(dist / (2.0 * vc))
            .ceil()
            .max(1.0);
        while !fits(n) {
            n += 1.0;
        }
        let phase = n.min(f64::from(u32::MAX / 4)) as u32;
        let n = f64::from(phase);

        self.curr_vel = 0.0;
        self.curr_acc = 0.0;
        self.accel_state = AccelState::S0;
        self.fine = Some(FineMove {
            dir,
            jerk: dist / (2.0 * n * n * n),
            phase,
            elapsed: 0,
            target: self.pos_cmd,
        });
        Transition::Rerun
    }

    fn fine_step(&mut self, fine: FineMove) -> Transition {
        if self.cruise_speed() == 0.0 {
            self.fine = None;
            return self.begin_brake(0.0);
        }

        let (sign, state) = match fine.elapsed / fine.phase {
            0 => (1.0, AccelState::S0),
            1 => (-1.0, AccelState::S2),
            2 => (-1.0, AccelState::S4),
            _ => (1.0, AccelState::S6),
        };
        let here = Kinematic::new(0.0, fine.dir * self.curr_vel, fine.dir * self.curr_acc);
        self.apply(here.step(sign * fine.jerk), fine.dir);

        let elapsed = fine.elapsed + 1;
        if elapsed >= 4 * fine.phase {
            // Only rounding is left between the integrated position and the target.
            self.curr_pos = fine.target;
            self.settle();
        } else {
            self.fine = Some(FineMove { elapsed, ..fine });
            self.accel_state = state;
        }
        Transition::Settled
    }

    fn brake_step(&mut self) -> Transition {
        let dir = self.brake_dir;
        let v_end = self.brake_to;
        let here = Kinematic::new(0.0, dir * self.curr_vel, dir * self.curr_acc);
        let (jerk, max_acc, tiny) = (self.jerk, self.max_acc, self.tiny());
        let v_rem = here.vel - v_end;

        if v_rem <= tiny && here.acc <= tiny {
            return self.finish_brake();
        }

        let peak = (v_rem.max(0.0) * jerk + 0.5 * here.acc * here.acc)
            .sqrt()
            .min(max_acc);
        let (j, state) = if here.acc > -peak + tiny {
            ((-peak - here.acc).max(-jerk), AccelState::S4)
        } else if v_rem > 0.5 * here.acc * here.acc / jerk {
            (0.0, AccelState::S5)
        } else {
            let want = if v_rem > 0.0 {
                0.5 * here.acc * here.acc / v_rem
            } else {
                jerk
            };
            (want.min(jerk).min(-here.acc).max(0.0), AccelState::S6)
        };

        let next = here.step(j);
        if next.vel <= v_end {
            let t = time_to_velocity(here.vel, here.acc, j, v_end).unwrap_or(1.0);
            self.curr_pos += dir * segment(here.vel, here.acc, j, t);
            return self.finish_brake();
        }
        if state == AccelState::S6 && next.acc >= -tiny {
            self.curr_pos += dir * next.pos;
            return self.finish_brake();
        }

        self.apply(next, dir);
        self.accel_state = state;
        Transition::Settled
    }

    /// Brake target reached: cruise on, or stop and re-plan toward `pos_cmd`.
    fn finish_brake(&mut self) -> Transition {
        self.curr_vel = self.brake_dir * self.brake_to;
        self.curr_acc = 0.0;
        if self.brake_to > 0.0 {
            self.accel_state = AccelState::S3;
        } else if self.cruise_speed() == 0.0 {
            self.settle();
        } else if (self.pos_cmd - self.curr_pos).abs() <= self.pos_epsilon() {
            self.land();
        } else {
            self.accel_state = AccelState::S0;
        }
        Transition::Settled
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
