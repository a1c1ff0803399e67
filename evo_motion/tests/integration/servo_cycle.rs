//! Integration test: TOML config → AxisSet → MotionCycle.

use std::io::Write;
use std::sync::atomic::AtomicBool;

use evo_motion::axis::{AxisInput, AxisStatusFlags};
use evo_motion::config::load_axis_set;
use evo_motion::cycle::{MachineInputs, MotionCycle};
use tempfile::NamedTempFile;

const MILL_TOML: &str = r#"
cycle_time_us = 1000

[shared]
service_name = "mill-it"

[[axes]]
letter = "X"
min_pos_limit = -20.0
max_pos_limit = 20.0
vel_limit = 50.0
acc_limit = 500.0
jerk_limit = 10000.0
ext_offset_vel_limit = 5.0
ext_offset_acc_limit = 50.0

[[axes]]
letter = "Y"
min_pos_limit = -20.0
max_pos_limit = 20.0
vel_limit = 50.0
acc_limit = 500.0
ext_offset_vel_limit = 5.0
ext_offset_acc_limit = 50.0

[[axes]]
letter = "Z"
min_pos_limit = -5.0
max_pos_limit = 5.0
vel_limit = 20.0
acc_limit = 200.0
locking_joint = 2
"#;

const RUNNING: MachineInputs = MachineInputs {
    teleop_mode: true,
    motion_enabled: true,
    homing_active: false,
    all_homed: true,
};

fn mill() -> MotionCycle {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(MILL_TOML.as_bytes()).unwrap();
    let (config, axes) = load_axis_set(file.path()).unwrap();
    assert_eq!(config.axes.len(), 3);
    let mut cycle = MotionCycle::new(axes);
    cycle.tick(RUNNING);
    cycle
}

#[test]
fn continuous_jog_stops_at_soft_limit() {
    let mut mc = mill();
    let running = AtomicBool::new(true);
    mc.axes.jog_continuous(0, 40.0);
    let ticks = mc.run(RUNNING, 100_000, false, &running).unwrap();
    assert!(ticks < 100_000);

    let out = mc.outputs();
    assert_eq!(out.positions[0], 20.0);
    assert_eq!(out.status[0].teleop_vel, 0.0);
    assert!(!out.status[0].flags.contains(AxisStatusFlags::KB_JOG));
    assert!(mc.is_idle());
}

#[test]
fn wheel_needs_teleop_mode() {
    let mut mc = mill();
    let wheel = |counts| AxisInput {
        jog_counts: counts,
        jog_enable: true,
        jog_scale: 0.005,
        ..Default::default()
    };

    mc.axes.set_input(1, wheel(400)).unwrap();
    let out = mc.tick(MachineInputs {
        teleop_mode: false,
        ..RUNNING
    });
    assert!(!out.status[1].flags.contains(AxisStatusFlags::WHEEL_JOG));

    mc.axes.set_input(1, wheel(800)).unwrap();
    let out = mc.tick(RUNNING);
    assert!(out.status[1].flags.contains(AxisStatusFlags::WHEEL_JOG));
    assert!(out.status[1].flags.contains(AxisStatusFlags::TELEOP_ACTIVE));

    for _ in 0..1_000 {
        mc.tick(RUNNING);
    }
    // Only the second delta (400 counts) was applied.
    assert!((mc.outputs().positions[1] - 2.0).abs() < 1e-6);

    // Z is a locking joint.
    mc.axes.set_input(2, wheel(100)).unwrap();
    mc.tick(RUNNING);
    mc.axes.set_input(2, wheel(300)).unwrap();
    let out = mc.tick(RUNNING);
    assert_eq!(out.positions[2], 0.0);
    assert!(out.status[2].flags.is_empty());
}

#[test]
fn offsets_wait_for_homing() {
    let mut mc = mill();
    let offset = AxisInput {
        eoffset_counts: 100,
        eoffset_enable: true,
        eoffset_scale: 0.01,
        ..Default::default()
    };
    mc.axes.set_input(0, offset).unwrap();
    for _ in 0..100 {
        let out = mc.tick(MachineInputs {
            all_homed: false,
            ..RUNNING
        });
        assert_eq!(out.positions[0], 0.0);
        assert!(!out.offsets_applied);
    }

    mc.axes
        .set_input(
            0,
            AxisInput {
                eoffset_counts: 150,
                ..offset
            },
        )
        .unwrap();
    for _ in 0..1_000 {
        mc.tick(RUNNING);
    }
    let out = *mc.outputs();
    assert!((out.positions[0] - 0.5).abs() < 1e-6);
    assert!((out.status[0].ext_offset_req - 0.5).abs() < 1e-6);
    assert!(out.offsets_applied);
    assert!(out.status[0].flags.contains(AxisStatusFlags::EXT_OFFSET_ACTIVE));

    mc.axes
        .set_input(
            0,
            AxisInput {
                eoffset_clear: true,
                eoffset_counts: 150,
                ..offset
            },
        )
        .unwrap();
    for _ in 0..1_000 {
        mc.tick(RUNNING);
    }
    assert!(mc.outputs().positions[0].abs() < 1e-6);
}
