//! Unit-step jerk-limited kinematics.
//!
//! All quantities are in per-cycle units: one call to [`Kinematic::step`]
//! advances time by exactly one servo cycle, velocity is distance per cycle,
//! acceleration is distance per cycle², jerk is distance per cycle³.

/// Position, velocity and acceleration of a single degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematic {
    /// [units]
    pub pos: f64,
    /// [units/cycle]
    pub vel: f64,
    /// [units/cycle²]
    pub acc: f64,
}

impl Kinematic {
    #[inline]
    pub const fn new(pos: f64, vel: f64, acc: f64) -> Self {
        Self { pos, vel, acc }
    }

    /// Advance one cycle under constant `jerk` (Taylor integration).
    #[inline]
    pub fn step(self, jerk: f64) -> Self {
        Self {
            pos: self.pos + self.vel + 0.5 * self.acc + jerk / 6.0,
            vel: self.vel + self.acc + 0.5 * jerk,
            acc: self.acc + jerk,
        }
    }
}

/// Distance covered in time `t` from `(vel, acc)` under constant `jerk`.
#[inline]
pub fn segment(vel: f64, acc: f64, jerk: f64, t: f64) -> f64 {
    t * (vel + t * (0.5 * acc + t * jerk / 6.0))
}

/// Earliest time in `[0, 1]` at which `vel + acc·t + jerk·t²/2` equals `target`.
///
/// Returns `None` when the velocity does not reach `target` within the cycle.
pub fn time_to_velocity(vel: f64, acc: f64, jerk: f64, target: f64) -> Option<f64> {
    let c = vel - target;
    if c == 0.0 {
        return Some(0.0);
    }
    let mut best: Option<f64> = None;
    let mut consider = |t: f64| {
        if (0.0..=1.0).contains(&t) && best.is_none_or(|b| t < b) {
            best = Some(t);
        }
    };
    if jerk == 0.0 {
        if acc != 0.0 {
            consider(-c / acc);
        }
    } else {
        let disc = acc * acc - 2.0 * jerk * c;
        if disc >= 0.0 {
            let root = disc.sqrt();
            consider((-acc - root) / jerk);
            consider((-acc + root) / jerk);
        }
    }
    best
}

/// Shortest distance needed to bring `(vel, acc)` to rest without reversing,
/// honouring `|acc| <= max_acc` and `|jerk| <= jerk`.
///
/// Assumes motion in the positive direction. The braking path has up to three
/// phases: jerk `-J` until the deceleration peak, a hold at the peak while
/// velocity is still above what the final ramp removes, and jerk `+J` back to
/// zero acceleration. Starting from any point on that path gives the remainder
/// of the same path, so one function serves every state of the planner.
///
/// Returns `f64::INFINITY` when the limits cannot stop the motion.
pub fn stopping_distance(vel: f64, acc: f64, max_acc: f64, jerk: f64) -> f64 {
    if vel <= 0.0 && acc <= 0.0 {
        return 0.0;
    }
    if max_acc <= 0.0 || jerk <= 0.0 {
        return f64::INFINITY;
    }

    let tiny = jerk * 1e-12;
    let mut v = vel;
    let mut a = acc;
    let mut dist = 0.0;

    // vJ + a²/2 is constant along a -J ramp and equals peak² at its end.
    let peak = (v.max(0.0) * jerk + 0.5 * a * a).sqrt().min(max_acc);
    if a > -peak + tiny {
        let t = (a + peak) / jerk;
        dist += segment(v, a, -jerk, t);
        v += t * (a - 0.5 * jerk * t);
        a = -peak;
    }
    if v <= 0.0 {
        return dist;
    }
    if a >= 0.0 {
        return f64::INFINITY;
    }

    let ramp_vel = 0.5 * a * a / jerk;
    if v <= ramp_vel {
        // Velocity hits zero before the deceleration ramps out.
        let t = (-a - (a * a - 2.0 * jerk * v).max(0.0).sqrt()) / jerk;
        return dist + segment(v, a, jerk, t);
    }

    let hold = (v - ramp_vel) / -a;
    dist += segment(v, a, 0.0, hold);
    dist + segment(ramp_vel, a, jerk, -a / jerk)
}

// ─── Tests ──────────────────────────────────────────────────────────
