//! Single-axis trajectory planner.
//!
//! A [`TrajectoryPlanner`] drives one degree of freedom toward `pos_cmd`
//! at up to `vel_cmd`, bounded by per-cycle velocity, acceleration and
//! jerk limits. With a positive jerk limit it follows a jerk-limited
//! S-curve (states S0..S6); with zero jerk it runs the classic
//! velocity-ramp trapezoid.
//!
//! Kinematic limits are stored pre-scaled by powers of the servo period
//! (velocity · T, acceleration · T², jerk · T³) so one [`TrajectoryPlanner::update`]
//! is one unit time step. Position is never scaled.
//!
//! # Lifecycle
//!
//! ```text
//! set_cycle_time ──► jog_continuous ──► update (each cycle) ──► Idle
//!                          ▲                 │
//!                          └── retarget ─────┘   jog_abort ──► brake ──► Idle
//! ```

pub mod kinematics;
mod scurve;
mod trapezoid;

use scurve::FineMove;

/// Commanded speeds below this [units/s] are treated as a stop request.
pub const VEL_CMD_EPSILON: f64 = 1e-9;

/// Upper bound on state transitions evaluated within one cycle.
pub const MAX_TRANSITIONS: usize = 8;

/// Remainders below this fraction of the target magnitude (at least one
/// unit) are rounding noise and snap onto the target.
pub const POS_EPSILON: f64 = 1e-12;

/// Trapezoid settle window as a fraction of the per-cycle acceleration.
pub const TRAPEZOID_TINY_FACTOR: f64 = 1e-3;

/// Phase of the jerk-limited profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccelState {
    /// Acceleration ramping up.
    S0,
    /// Acceleration pinned at `max_acc`.
    S1,
    /// Acceleration ramping back to zero before cruise.
    S2,
    /// Cruise.
    S3,
    /// Deceleration ramping up.
    S4,
    /// Deceleration pinned.
    S5,
    /// Deceleration ramping out.
    S6,
    /// No motion; `pos_cmd == curr_pos`.
    #[default]
    Idle,
}

impl AccelState {
    /// `true` for the braking states S4..S6.
    #[inline]
    pub const fn is_braking(self) -> bool {
        matches!(self, Self::S4 | Self::S5 | Self::S6)
    }
}

/// Outcome of one state-machine evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Kinematics advanced (or nothing to do); the cycle is complete.
    Settled,
    /// State changed without motion; evaluate again this cycle.
    Rerun,
}

/// One planner instance. Teleop and external offset each own one per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPlanner {
    /// Cleared by [`TrajectoryPlanner::disable`]; a disabled planner brakes
    /// to rest and tracks its own position.
    pub enabled: bool,
    /// Still moving or away from `pos_cmd`.
    pub active: bool,
    /// Target position.
    pub pos_cmd: f64,
    /// Cruise speed magnitude [units/cycle].
    pub vel_cmd: f64,
    /// [units/cycle]
    pub max_vel: f64,
    /// [units/cycle²]
    pub max_acc: f64,
    /// [units/cycle³]; zero selects the trapezoid.
    pub jerk: f64,
    /// Commanded position of this cycle.
    pub curr_pos: f64,
    /// [units/cycle]
    pub curr_vel: f64,
    /// [units/cycle²]
    pub curr_acc: f64,
    /// Profile phase; `Idle` once the target is reached.
    pub accel_state: AccelState,
    /// Stop requested by [`TrajectoryPlanner::jog_abort`], not yet at rest.
    pub aborting: bool,
    /// Servo period [s].
    pub cycle_time: f64,
    /// Position when the current move was armed.
    start_pos: f64,
    /// Signed displacement requested when the current move was armed.
    target_disp: f64,
    /// Speed magnitude the brake states decelerate to [units/cycle].
    brake_to: f64,
    /// Direction of travel while braking (±1).
    brake_dir: f64,
    /// Final reduced-jerk approach, when one is running.
    fine: Option<FineMove>,
}

impl Default for TrajectoryPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectoryPlanner {
    /// All-zero planner, idle and disabled.
    pub const fn new() -> Self {
        Self {
            enabled: false,
            active: false,
            pos_cmd: 0.0,
            vel_cmd: 0.0,
            max_vel: 0.0,
            max_acc: 0.0,
            jerk: 0.0,
            curr_pos: 0.0,
            curr_vel: 0.0,
            curr_acc: 0.0,
            accel_state: AccelState::Idle,
            aborting: false,
            cycle_time: 0.0,
            start_pos: 0.0,
            target_disp: 0.0,
            brake_to: 0.0,
            brake_dir: 1.0,
            fine: None,
        }
    }

    /// Set the servo period [s]. Already scaled quantities are rescaled.
    pub fn set_cycle_time(&mut self, seconds: f64) {
        if self.cycle_time > 0.0 && seconds > 0.0 {
            self.rescale(seconds);
        } else {
            self.cycle_time = seconds;
        }
    }

    /// Begin or redirect motion toward `pos_cmd` at `vel_cmd`.
    ///
    /// Limits are absolute (units/s, units/s², units/s³) and are scaled to
    /// per-cycle units here. The jerk is capped at a quarter of the cruise
    /// speed per cycle so a slow jog can still ramp. A request that would not move an idle planner
    /// (zero speed, or a target equal to the current position) leaves the
    /// planner untouched.
    pub fn jog_continuous(
        &mut self,
        pos_cmd: f64,
        vel_cmd: f64,
        max_vel: f64,
        max_acc: f64,
        max_jerk: f64,
    ) {
        let at_rest = self.accel_state == AccelState::Idle;
        if at_rest && (vel_cmd.abs() <= VEL_CMD_EPSILON || pos_cmd == self.curr_pos) {
            return;
        }

        let t = self.cycle_time;
        self.max_vel = max_vel.abs() * t;
        self.max_acc = max_acc.abs() * t * t;
        self.jerk = max_jerk.max(0.0) * t * t * t;
        self.vel_cmd = vel_cmd.abs().min(max_vel.abs()) * t;
        if self.vel_cmd > 0.0 {
            self.jerk = self.jerk.min(0.25 * self.vel_cmd);
        }
        self.pos_cmd = pos_cmd;
        self.start_pos = self.curr_pos;
        self.target_disp = pos_cmd - self.curr_pos;
        self.enabled = true;
        self.aborting = false;
        self.active = true;
        self.accel_state = AccelState::S0;
        self.fine = None;
    }

    /// Request a stop. `immediate` zeroes velocity and acceleration on the
    /// spot; otherwise the profile decelerates over the following cycles.
    pub fn jog_abort(&mut self, immediate: bool) {
        self.vel_cmd = 0.0;
        if immediate {
            self.curr_vel = 0.0;
            self.curr_acc = 0.0;
        }
        if self.accel_state == AccelState::Idle {
            self.pos_cmd = self.curr_pos;
        } else {
            self.aborting = true;
        }
    }

    /// Advance one servo cycle of `period` seconds.
    pub fn update(&mut self, period: f64) {
        if period > 0.0 && self.cycle_time > 0.0 && (period - self.cycle_time).abs() > 1e-12 {
            self.rescale(period);
        }

        if self.aborting && self.curr_vel.abs() < self.vel_epsilon() {
            self.settle();
            return;
        }
        if self.accel_state == AccelState::Idle {
            if !self.enabled {
                self.pos_cmd = self.curr_pos;
            }
            self.active = false;
            return;
        }

        if self.jerk > 0.0 {
            for _ in 0..MAX_TRANSITIONS {
                if self.transition() == Transition::Settled {
                    break;
                }
            }
        } else {
            self.trapezoid_step();
        }

        self.active = self.accel_state != AccelState::Idle;
    }

    /// Place the planner at rest on `pos`, with `pos_cmd = pos`.
    pub fn reset_to(&mut self, pos: f64) {
        self.curr_pos = pos;
        self.settle();
    }

    /// Pin the planner at `pos` with zero velocity and acceleration.
    ///
    /// A moving planner keeps its target and re-plans from rest next cycle.
    pub fn hold_at(&mut self, pos: f64) {
        self.curr_pos = pos;
        self.curr_vel = 0.0;
        self.curr_acc = 0.0;
        self.fine = None;
        if self.accel_state != AccelState::Idle {
            self.accel_state = AccelState::S0;
        }
    }

    /// Disable; the planner brakes to rest and then tracks `curr_pos`.
    #[inline]
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Re-enable after [`TrajectoryPlanner::disable`].
    #[inline]
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Moving, or still away from `pos_cmd`.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Velocity [units/s].
    #[inline]
    pub fn velocity(&self) -> f64 {
        if self.cycle_time > 0.0 {
            self.curr_vel / self.cycle_time
        } else {
            0.0
        }
    }

    /// Acceleration [units/s²].
    #[inline]
    pub fn acceleration(&self) -> f64 {
        if self.cycle_time > 0.0 {
            self.curr_acc / (self.cycle_time * self.cycle_time)
        } else {
            0.0
        }
    }

    /// Travelled and requested displacement of the current move.
    #[inline]
    pub fn progress(&self) -> (f64, f64) {
        (self.curr_pos - self.start_pos, self.target_disp)
    }

    /// Snap to `Idle` at the current position.
    fn settle(&mut self) {
        self.accel_state = AccelState::Idle;
        self.pos_cmd = self.curr_pos;
        self.vel_cmd = 0.0;
        self.curr_vel = 0.0;
        self.curr_acc = 0.0;
        self.aborting = false;
        self.active = false;
        self.fine = None;
    }

    /// Snap onto `pos_cmd` and settle.
    fn land(&mut self) {
        self.curr_pos = self.pos_cmd;
        self.settle();
    }

    /// Remaining distance treated as already covered [units].
    #[inline]
    fn pos_epsilon(&self) -> f64 {
        POS_EPSILON * self.pos_cmd.abs().max(1.0)
    }

    /// Speed below which an aborting planner counts as stopped [units/cycle].
    #[inline]
    fn vel_epsilon(&self) -> f64 {
        VEL_CMD_EPSILON * self.cycle_time
    }

    /// Effective cruise speed [units/cycle]; zero when stopping.
    #[inline]
    fn cruise_speed(&self) -> f64 {
        if !self.enabled || self.aborting {
            return 0.0;
        }
        let vc = self.vel_cmd.min(self.max_vel);
        if vc <= self.vel_epsilon() { 0.0 } else { vc }
    }

    fn rescale(&mut self, period: f64) {
        let r = period / self.cycle_time;
        let r2 = r * r;
        self.curr_vel *= r;
        self.curr_acc *= r2;
        self.vel_cmd *= r;
        self.max_vel *= r;
        self.max_acc *= r2;
        self.jerk *= r2 * r;
        self.brake_to *= r;
        self.cycle_time = period;
        // A fine approach is shaped for the old period; re-plan it.
        if self.fine.take().is_some() {
            self.accel_state = AccelState::S0;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
