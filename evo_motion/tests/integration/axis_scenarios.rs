//! Integration test: axis layer jogging, wheel guards and soft limits.

use evo_common::consts::MAX_AXIS;
use evo_motion::axis::{AxisInput, AxisSet, LimitSide};

const T: f64 = 0.001;

fn machine() -> AxisSet {
    let mut set = AxisSet::new(T);
    for i in 0..3 {
        set.set_pos_limits(i, -10.0, 10.0).unwrap();
        set.set_vel_limit(i, 10.0).unwrap();
        set.set_acc_limit(i, 100.0).unwrap();
        set.set_ext_offset_vel_limit(i, 5.0).unwrap();
        set.set_ext_offset_acc_limit(i, 50.0).unwrap();
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

#[test]
fn locking_joint_ignores_wheel_counts() {
    let mut set = machine();
    set.set_locking_joint(2, Some(2)).unwrap();

    for counts in [0, 150, 900, -400] {
        set.set_input(2, wheel(counts)).unwrap();
        set.handle_jogwheels(true, true, false);
        let z = set.get(2).unwrap();
        assert_eq!(z.teleop_tp.pos_cmd, 0.0);
        assert!(!z.wheel_jog_active);
    }
    // Keyboard jogging of the same axis is still allowed.
    set.jog_incremental(2, 1.0, 5.0);
    assert_eq!(set.get(2).unwrap().teleop_tp.pos_cmd, 1.0);
}

#[test]
fn limit_clamp_holds_until_commanded_back() {
    let mut set = machine();
    {
        let tp = &mut set.get_mut(0).unwrap().teleop_tp;
        tp.reset_to(9.0);
        tp.jog_continuous(10.5, 10.0, 10.0, 100.0, 0.0);
    }

    let mut first_violation = None;
    for n in 0..500 {
        let violated = set.calc_motion(T);
        let x = set.get(0).unwrap();
        match first_violation {
            None if violated => {
                first_violation = Some(n);
                assert_eq!(x.pos_cmd, 10.0);
            }
            None => assert!(x.pos_cmd <= 10.0),
            Some(_) => assert_eq!(x.pos_cmd, 10.0),
        }
    }
    assert!(first_violation.is_some());
    // The target beyond the limit was dropped at the clamp.
    assert!(!set.get(0).unwrap().teleop_tp.is_active());
    assert_eq!(set.get(0).unwrap().teleop_tp.pos_cmd, 10.0);

    set.jog_absolute(0, 5.0, 10.0);
    for _ in 0..2_000 {
        assert!(!set.calc_motion(T));
    }
    let x = set.get(0).unwrap();
    assert!((x.pos_cmd - 5.0).abs() < 1e-6);
    assert!(!set.jog_is_active());
}

#[test]
fn offset_rollback_pins_sum_at_limit() {
    let mut set = machine();
    let mut coord = [0.0; MAX_AXIS];
    coord[0] = 9.0;
    set.sync_teleop_tp_to_coord(&coord);

    set.plan_external_offsets(T, true, true);
    set.set_input(
        0,
        AxisInput {
            eoffset_counts: 2_000,
            eoffset_enable: true,
            eoffset_scale: 0.001,
            ..Default::default()
        },
    )
    .unwrap();

    let mut clamped = 0;
    for _ in 0..2_000 {
        set.plan_external_offsets(T, true, true);
        let mut pos = set.pos_cmds();
        if set.update_coord_with_bound(&mut pos, T) {
            clamped += 1;
            let x = set.get(0).unwrap();
            assert_eq!(pos[0], 10.0);
            assert_eq!(x.ext_offset_tp.curr_pos, 1.0);
            assert_eq!(x.ext_offset_tp.curr_vel, 0.0);
        }
        assert!(pos[0] <= 10.0);
        set.calc_motion(T);
    }
    assert!(clamped > 0);

    let mut failing = [LimitSide::Within; MAX_AXIS];
    let mut pos = [0.0; MAX_AXIS];
    set.sync_coord_to_teleop_tp(&mut pos);
    assert_eq!(pos[0], 10.0);
    assert!(set.check_constraints(&pos, &mut failing));
}

#[test]
fn wheel_jog_blocks_keyboard_jog() {
    let mut set = machine();
    set.set_input(1, wheel(0)).unwrap();
    set.handle_jogwheels(true, true, false);
    set.set_input(1, wheel(200)).unwrap();
    set.handle_jogwheels(true, true, false);
    assert!(set.get(1).unwrap().wheel_jog_active);

    set.jog_incremental(1, 3.0, 5.0);
    let y = set.get(1).unwrap();
    assert!((y.teleop_tp.pos_cmd - 2.0).abs() < 1e-12);
    assert!(!y.kb_jog_active);

    for _ in 0..2_000 {
        set.calc_motion(T);
    }
    assert!(!set.jog_is_active());
    set.jog_incremental(1, 3.0, 5.0);
    assert!(set.get(1).unwrap().kb_jog_active);
}

#[test]
fn inactive_axes_are_never_limited() {
    let mut set = machine();
    set.set_vel_limit(5, 100.0).unwrap();
    set.set_acc_limit(5, 1_000.0).unwrap();
    set.jog_continuous(5, 100.0);
    let c = set.get(5).unwrap();
    assert!(c.limits.is_none());
    assert!(c.kb_jog_active);
    assert!(c.teleop_tp.pos_cmd > 1.0e8);

    let mut pos = [0.0; MAX_AXIS];
    pos[5] = 1.0e12;
    let mut failing = [LimitSide::Above; MAX_AXIS];
    assert!(set.check_constraints(&pos, &mut failing));
    assert_eq!(failing[5], LimitSide::Within);
}

#[test]
fn short_scurve_jogs_land_at_slow_servo_rate() {
    // 10 ms servo period: a full-jerk move covers at least 0.02 units.
    let t = 0.01;
    let mut set = AxisSet::new(t);
    set.set_pos_limits(0, -100.0, 100.0).unwrap();
    set.set_vel_limit(0, 10.0).unwrap();
    set.set_acc_limit(0, 100.0).unwrap();
    set.set_jerk_limit(0, 10_000.0).unwrap();

    let mut expected = 0.0;
    for step in [0.01, 0.1, 5.0, -0.003] {
        set.jog_incremental(0, step, 10.0);
        assert!(set.jog_is_active(), "jog by {step} was not armed");
        expected += step;
        for _ in 0..5_000 {
            set.calc_motion(t);
            if !set.jog_is_active() {
                break;
            }
        }
        assert!(!set.jog_is_active());
        let x = set.get(0).unwrap();
        assert!(
            (x.pos_cmd - expected).abs() < 1e-9,
            "jog by {step}: at {} instead of {expected}",
            x.pos_cmd
        );
    }
}
