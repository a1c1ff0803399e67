//! # EVO Motion
//!
//! Teleop and external-offset motion core, driven from the command line.
//!
//! Loads the axis configuration, arms one keyboard jog (continuous, or
//! incremental with `--increment`), runs the servo cycle until the move
//! completes, `--cycles` is reached or Ctrl-C arrives, and logs the final
//! commanded positions with the cycle statistics.

use clap::Parser;
use evo_common::consts::{DEFAULT_CONFIG_PATH, axis_index};
use evo_motion::config::load_axis_set;
use evo_motion::cycle::{MachineInputs, MotionCycle, RtPlacement};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// EVO Motion: teleop jog and external offset core
#[derive(Parser, Debug)]
#[command(name = "evo_motion")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Jerk-limited teleop jogging with external offsets and soft limits")]
struct Args {
    /// Path to the motion configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Axis letter to jog.
    #[arg(long, default_value_t = 'X')]
    axis: char,

    /// Jog speed [units/s]; the sign selects the direction of a continuous jog.
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    jog_vel: f64,

    /// Jog by this distance instead of continuously.
    #[arg(long, allow_negative_numbers = true)]
    increment: Option<f64>,

    /// Maximum number of servo cycles to run.
    #[arg(long, default_value_t = 100_000)]
    cycles: u64,

    /// Pace cycles at the configured servo period instead of free-running.
    #[arg(long)]
    realtime: bool,

    /// CPU core to pin the servo thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("EVO Motion v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("EVO Motion shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let index = axis_index(args.axis).ok_or_else(|| format!("unknown axis letter {:?}", args.axis))?;

    let (config, axes) = load_axis_set(&args.config)?;
    if config.axis(args.axis).is_none() {
        return Err(format!("axis {} is not configured in {}", args.axis, args.config.display()).into());
    }

    if args.realtime {
        RtPlacement {
            cpu_core: args.cpu_core,
            priority: args.rt_priority,
        }
        .apply()?;
        info!(
            "RT setup complete (cpu_core={}, priority={})",
            args.cpu_core, args.rt_priority
        );
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut cycle = MotionCycle::new(axes);
    let machine = MachineInputs {
        teleop_mode: true,
        motion_enabled: true,
        homing_active: false,
        all_homed: true,
    };
    // Latch counters before any jog is armed.
    cycle.tick(machine);

    match args.increment {
        Some(offset) => cycle.axes.jog_incremental(index, offset, args.jog_vel),
        None => cycle.axes.jog_continuous(index, args.jog_vel),
    }
    if !cycle.axes.jog_is_active() {
        info!(axis = %args.axis, "jog refused or zero, nothing to do");
        return Ok(());
    }
    info!(
        axis = %args.axis,
        vel = args.jog_vel,
        increment = ?args.increment,
        "jog armed"
    );

    let ticks = cycle.run(machine, args.cycles, args.realtime, &running)?;
    if !running.load(Ordering::SeqCst) || !cycle.is_idle() {
        cycle.axes.jog_abort_all(true);
        cycle.tick(machine);
    }

    let out = cycle.outputs();
    for (i, axis) in cycle.axes.iter().enumerate() {
        if axis.limits.is_some() {
            info!(
                axis = %axis.letter,
                pos = out.positions[i],
                offset = out.status[i].ext_offset,
                clamped = axis.teleop_clamped || axis.offset_clamped,
                "final command"
            );
        }
    }
    let stats = &cycle.stats;
    info!(
        ticks,
        mean_ns = stats.mean_tick_ns(),
        max_ns = stats.max_tick_ns,
        spread_ns = stats.tick_spread_ns(),
        max_wake_late_ns = stats.max_wake_late_ns,
        overruns = stats.overruns,
        clamped_ticks = stats.clamped_ticks,
        peak_vel = stats.peak_compound_vel,
        "servo statistics"
    );

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
