//! Servo cycle: offsets → jog wheels → bounded coordinates → teleop.
//!
//! [`MotionCycle::tick`] runs one servo period over the whole [`AxisSet`]
//! in the order the axis layer requires:
//!
//! 1. `plan_external_offsets` consumes offset counter deltas.
//! 2. `handle_jogwheels` consumes wheel counter deltas.
//! 3. `update_coord_with_bound` advances the offset planners on top of the
//!    teleop base and pins the sum to the soft limits.
//! 4. `calc_motion` advances the teleop planners, checked against the
//!    already-updated offsets.
//!
//! The tick body performs no allocation and no I/O apart from `warn!` on
//! soft-limit edges.
//!
//! [`RtPlacement::apply`] locks memory, prefaults the stack, pins the
//! thread and switches it to `SCHED_FIFO`. Without the `rt` feature the
//! system calls are skipped and [`MotionCycle::run`] paces itself with
//! `std::thread::sleep`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use evo_common::consts::MAX_AXIS;
use tracing::{debug, warn};

use crate::axis::{AxisSet, AxisStatus, CoordPositions};
use crate::error::CycleError;

// ─── Servo Telemetry ────────────────────────────────────────────────

/// Per-run servo telemetry. [`ServoStats::record`] is O(1) and does not
/// allocate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServoStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Longest tick body [ns].
    pub max_tick_ns: u64,
    /// Sum of tick durations [ns].
    pub total_tick_ns: u64,
    /// Sum of squared tick durations [ns²].
    pub total_sq_tick_ns: u128,
    /// Paced ticks whose body ran past the servo period.
    pub overruns: u64,
    /// Largest delay between the scheduled and the actual tick start [ns].
    pub max_wake_late_ns: u64,
    /// Ticks on which a soft limit clamped some axis.
    pub clamped_ticks: u64,
    /// Highest compound teleop velocity seen [units/s].
    pub peak_compound_vel: f64,
}

#[inline]
fn as_ns(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl ServoStats {
    /// Fold one tick into the totals.
    #[inline]
    pub fn record(&mut self, tick: Duration, wake_late: Duration, out: &CycleOutputs) {
        let tick_ns = as_ns(tick);
        self.ticks += 1;
        self.max_tick_ns = self.max_tick_ns.max(tick_ns);
        self.total_tick_ns = self.total_tick_ns.saturating_add(tick_ns);
        self.total_sq_tick_ns += u128::from(tick_ns) * u128::from(tick_ns);
        self.max_wake_late_ns = self.max_wake_late_ns.max(as_ns(wake_late));
        self.clamped_ticks += u64::from(out.limit_violated);
        self.peak_compound_vel = self.peak_compound_vel.max(out.compound_vel);
    }

    /// Mean tick duration [ns]; zero before the first tick.
    pub fn mean_tick_ns(&self) -> u64 {
        self.total_tick_ns.checked_div(self.ticks).unwrap_or(0)
    }

    /// Population standard deviation of the tick duration [ns].
    pub fn tick_spread_ns(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        let n = self.ticks as f64;
        let mean = self.total_tick_ns as f64 / n;
        (self.total_sq_tick_ns as f64 / n - mean * mean).max(0.0).sqrt()
    }
}

// ─── RT Placement ───────────────────────────────────────────────────

/// Stack touched before the first tick so the servo loop never faults it in.
const STACK_PREFAULT_BYTES: usize = 256 * 1024;

/// Where and how the servo thread runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtPlacement {
    /// CPU core the calling thread is pinned to.
    pub cpu_core: usize,
    /// `SCHED_FIFO` priority.
    pub priority: i32,
}

impl RtPlacement {
    /// Lock memory, prefault the stack, pin the calling thread and switch
    /// it to `SCHED_FIFO`. Without the `rt` feature only the prefault runs.
    pub fn apply(self) -> Result<(), CycleError> {
        lock_memory()?;
        prefault_stack();
        self.pin()?;
        self.schedule()?;
        debug!(
            cpu_core = self.cpu_core,
            priority = self.priority,
            rt = cfg!(feature = "rt"),
            "servo thread placed"
        );
        Ok(())
    }

    fn pin(self) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            use nix::sched::{CpuSet, sched_setaffinity};
            use nix::unistd::Pid;

            let mut cpus = CpuSet::new();
            cpus.set(self.cpu_core)
                .map_err(|e| CycleError::rt("cpu set", e.into()))?;
            sched_setaffinity(Pid::from_raw(0), &cpus)
                .map_err(|e| CycleError::rt("sched_setaffinity", e.into()))?;
        }
        Ok(())
    }

    fn schedule(self) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            let param = libc::sched_param {
                sched_priority: self.priority,
            };
            // SAFETY: `param` outlives the call; pid 0 is the calling thread.
            if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
                return Err(CycleError::rt(
                    "sched_setscheduler",
                    std::io::Error::last_os_error(),
                ));
            }
        }
        Ok(())
    }
}

fn lock_memory() -> Result<(), CycleError> {
    #[cfg(feature = "rt")]
    {
        use nix::sys::mman::{MlockallFlags, mlockall};
        mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
            .map_err(|e| CycleError::rt("mlockall", e.into()))?;
    }
    Ok(())
}

fn prefault_stack() {
    let mut stack = [0u8; STACK_PREFAULT_BYTES];
    for page in stack.chunks_mut(4096) {
        page[0] = 1;
    }
    std::hint::black_box(&stack);
}

// ─── Cycle I/O ──────────────────────────────────────────────────────

/// Machine-wide flags sampled once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MachineInputs {
    /// Teleop mode selected; the jog wheels are live only then.
    pub teleop_mode: bool,
    /// Drives enabled.
    pub motion_enabled: bool,
    /// A homing sequence is running.
    pub homing_active: bool,
    /// Every joint is homed; offsets are accepted only then.
    pub all_homed: bool,
}

/// Everything a tick produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleOutputs {
    /// Commanded position per axis, external offset included.
    pub positions: CoordPositions,
    /// Per-axis status snapshot.
    pub status: [AxisStatus; MAX_AXIS],
    /// A soft limit clamped some axis this cycle.
    pub limit_violated: bool,
    /// Some axis carried a non-negligible offset when the cycle began.
    pub offsets_applied: bool,
    /// Euclidean teleop speed [units/s].
    pub compound_vel: f64,
}

impl Default for CycleOutputs {
    fn default() -> Self {
        Self {
            positions: [0.0; MAX_AXIS],
            status: [AxisStatus::default(); MAX_AXIS],
            limit_violated: false,
            offsets_applied: false,
            compound_vel: 0.0,
        }
    }
}

// ─── Motion Cycle ───────────────────────────────────────────────────

/// Owns the axes and runs them one servo period at a time.
#[derive(Debug, Clone)]
pub struct MotionCycle {
    /// Axes driven by this cycle; jog requests go here between ticks.
    pub axes: AxisSet,
    /// Telemetry of [`MotionCycle::run`].
    pub stats: ServoStats,
    outputs: CycleOutputs,
    /// Per-axis clamp state of the previous cycle, for edge logging.
    was_clamped: [bool; MAX_AXIS],
}

impl MotionCycle {
    pub fn new(axes: AxisSet) -> Self {
        Self {
            axes,
            stats: ServoStats::default(),
            outputs: CycleOutputs::default(),
            was_clamped: [false; MAX_AXIS],
        }
    }

    /// Servo period [s].
    #[inline]
    pub fn period(&self) -> f64 {
        self.axes.cycle_time()
    }

    /// Outputs of the last tick.
    #[inline]
    pub fn outputs(&self) -> &CycleOutputs {
        &self.outputs
    }

    /// Run one servo period. Axis inputs must already be set.
    pub fn tick(&mut self, machine: MachineInputs) -> &CycleOutputs {
        let period = self.period();

        let offsets_applied =
            self.axes
                .plan_external_offsets(period, machine.motion_enabled, machine.all_homed);
        self.axes.handle_jogwheels(
            machine.teleop_mode,
            machine.motion_enabled,
            machine.homing_active,
        );

        let mut base = self.axes.pos_cmds();
        let offset_violated = self.axes.update_coord_with_bound(&mut base, period);
        let teleop_violated = self.axes.calc_motion(period);

        let out = &mut self.outputs;
        self.axes.sync_coord_to_teleop_tp(&mut out.positions);
        for (i, status) in out.status.iter_mut().enumerate() {
            if let Some(s) = self.axes.status(i) {
                *status = s;
            }
        }
        out.limit_violated = offset_violated || teleop_violated;
        out.offsets_applied = offsets_applied;
        out.compound_vel = self.axes.compound_velocity();

        self.log_clamp_edges();
        &self.outputs
    }

    /// No planner has distance to go.
    pub fn is_idle(&self) -> bool {
        !self.axes.jog_is_active()
            && self
                .axes
                .iter()
                .all(|axis| !axis.teleop_tp.is_active() && !axis.ext_offset_tp.is_active())
    }

    /// Tick until idle, `max_cycles` is reached or `running` drops.
    ///
    /// With `paced` set, each tick is followed by a sleep for the rest of
    /// the servo period. Returns the number of ticks executed.
    pub fn run(
        &mut self,
        machine: MachineInputs,
        max_cycles: u64,
        paced: bool,
        running: &AtomicBool,
    ) -> Result<u64, CycleError> {
        let period = Duration::from_secs_f64(self.period());
        let mut next_wake = Instant::now();
        let mut ticks = 0;

        while ticks < max_cycles && running.load(Ordering::Relaxed) {
            let start = Instant::now();
            let wake_late = if paced {
                start.saturating_duration_since(next_wake)
            } else {
                Duration::ZERO
            };

            self.tick(machine);
            ticks += 1;

            let took = start.elapsed();
            self.stats.record(took, wake_late, &self.outputs);
            if paced && took > period {
                self.stats.overruns += 1;
                if cfg!(feature = "rt") {
                    return Err(CycleError::Overrun {
                        tick_ns: as_ns(took),
                        period_ns: as_ns(period),
                    });
                }
            }

            if self.is_idle() {
                break;
            }
            if paced {
                next_wake += period;
                if let Some(remaining) = next_wake.checked_duration_since(Instant::now()) {
                    std::thread::sleep(remaining);
                }
            }
        }
        Ok(ticks)
    }

    fn log_clamp_edges(&mut self) {
        for (i, was) in self.was_clamped.iter_mut().enumerate() {
            let Some(axis) = self.axes.get(i) else {
                continue;
            };
            let clamped = axis.offset_clamped || axis.teleop_clamped;
            if clamped && !*was {
                warn!(
                    axis = %axis.letter,
                    pos = self.outputs.positions[i],
                    offset = axis.offset_clamped,
                    teleop = axis.teleop_clamped,
                    "soft limit reached, command clamped"
                );
            } else if !clamped && *was {
                debug!(axis = %axis.letter, "soft limit clamp released");
            }
            *was = clamped;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
