//! Integration test: single-axis planner moves at 1 kHz.
//!
//! Limits: 10 units/s, 100 units/s², and either zero jerk (trapezoid) or
//! 10 000 units/s³ (S-curve).

use evo_motion::tp::{AccelState, TrajectoryPlanner};

const T: f64 = 0.001;
const V: f64 = 10.0;
const A: f64 = 100.0;
const J: f64 = 10_000.0;

struct Trace {
    cycles: usize,
    peak_vel: f64,
    states: Vec<AccelState>,
}

fn run(target: f64, jerk: f64) -> (TrajectoryPlanner, Trace) {
    let mut tp = TrajectoryPlanner::new();
    tp.set_cycle_time(T);
    tp.jog_continuous(target, V, V, A, jerk);

    let mut trace = Trace {
        cycles: 0,
        peak_vel: 0.0,
        states: Vec::new(),
    };
    while tp.accel_state != AccelState::Idle {
        tp.update(T);
        trace.cycles += 1;
        trace.peak_vel = trace.peak_vel.max(tp.velocity().abs());
        if trace.states.last() != Some(&tp.accel_state) {
            trace.states.push(tp.accel_state);
        }
        assert!(tp.curr_vel.abs() <= tp.max_vel + 1e-12);
        assert!(tp.curr_acc.abs() <= tp.max_acc + 1e-12);
        assert!(trace.cycles < 100_000, "planner never settled: {tp:?}");
    }
    (tp, trace)
}

#[test]
fn trapezoid_five_unit_move() {
    let (tp, trace) = run(5.0, 0.0);
    assert!((tp.curr_pos - 5.0).abs() < 1e-6, "landed at {}", tp.curr_pos);
    assert_eq!(tp.curr_vel, 0.0);
    assert!((trace.peak_vel - V).abs() < 1e-9);
    assert!(trace.states.contains(&AccelState::S3));
    // 0.1 s ramp up, 0.4 s cruise, 0.1 s ramp down.
    assert!(trace.cycles > 550 && trace.cycles < 700, "{} cycles", trace.cycles);
}

#[test]
fn trapezoid_short_move_never_cruises() {
    let (tp, trace) = run(0.05, 0.0);
    assert!((tp.curr_pos - 0.05).abs() < 1e-6);
    assert!(!trace.states.contains(&AccelState::S3));
    assert!(trace.peak_vel < V);
}

#[test]
fn scurve_long_move_lands_without_overshoot() {
    let (tp, trace) = run(5.0, J);
    assert_eq!(tp.curr_pos, 5.0);
    assert_eq!(tp.pos_cmd, 5.0);
    assert!(trace.peak_vel <= V + 1e-9);
    assert_eq!(trace.states.first(), Some(&AccelState::S0));
    assert!(trace.states.contains(&AccelState::S3));
}

#[test]
fn scurve_short_move_goes_straight_to_braking() {
    let (tp, trace) = run(0.05, J);
    assert_eq!(tp.curr_pos, 0.05);
    assert!(!trace.states.contains(&AccelState::S3));
    assert!(trace.states.iter().any(|s| s.is_braking()));
}

#[test]
fn abort_mid_ramp_comes_to_rest() {
    let mut tp = TrajectoryPlanner::new();
    tp.set_cycle_time(T);
    tp.jog_continuous(50.0, V, V, A, 0.0);
    for _ in 0..50 {
        tp.update(T);
    }
    assert!(tp.is_active());
    tp.jog_abort(false);
    let mut last = tp.curr_vel.abs();
    for _ in 0..1_000 {
        tp.update(T);
        assert!(tp.curr_vel.abs() <= last + 1e-15);
        last = tp.curr_vel.abs();
    }
    assert_eq!(tp.accel_state, AccelState::Idle);
    assert!(!tp.is_active());
    assert_eq!(tp.pos_cmd, tp.curr_pos);
    assert!(tp.curr_pos < 50.0);
}
