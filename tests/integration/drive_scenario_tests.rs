//! Drive loop scenarios: pedals → ramp → motor duties over many ticks.
//!
//! Time is driven by the test, one `tick(now_ms)` per simulated period, so
//! every scenario is deterministic.

use std::sync::Arc;
use std::time::Duration;

use powerwheel::app::ports::{MotorChannel, StoragePort};
use powerwheel::app::state::ControlState;
use powerwheel::config::{DriveConfig, KEY_MAX_FORWARD};
use powerwheel::control::drive::DriveLoop;
use powerwheel::error::ActuatorError;

use crate::mock_hw::{MockHardware, MockStore, MotorCall};

fn make_drive(max_forward: f32, max_backward: f32) -> (DriveLoop<MockHardware>, Arc<ControlState>) {
    let state = Arc::new(ControlState::new(max_forward, max_backward));
    let drive = DriveLoop::new(
        MockHardware::new(),
        Arc::clone(&state),
        &DriveConfig::default(),
        0,
    );
    (drive, state)
}

/// Tick every `period_ms` starting after `start_ms` until `stop` holds or
/// `limit` ticks have run.  Returns the time of the last tick.
fn run_until(
    drive: &mut DriveLoop<MockHardware>,
    start_ms: u64,
    period_ms: u64,
    limit: usize,
    mut stop: impl FnMut() -> bool,
) -> u64 {
    let mut now = start_ms;
    for _ in 0..limit {
        now += period_ms;
        drive.tick(now).unwrap();
        if stop() {
            break;
        }
    }
    now
}

/// Accelerate from rest to a steady `max_forward` and return the time.
fn cruise(drive: &mut DriveLoop<MockHardware>, state: &ControlState) -> u64 {
    drive.hardware_mut().press(true, false);
    let target = state.max_forward();
    run_until(drive, 0, 20, 500, || state.current_speed() == target)
}

// ── Forward acceleration ──────────────────────────────────────

#[test]
fn full_forward_pedal_reaches_limit_within_two_seconds() {
    let (mut drive, state) = make_drive(60.0, 35.0);
    drive.hardware_mut().press(true, false);

    let mut speeds = Vec::new();
    for i in 1..=100u64 {
        drive.tick(i * 20).unwrap();
        speeds.push(state.current_speed());
    }

    assert_eq!(speeds[0], 0.5, "first tick leaves rest by one increment");
    assert_eq!(speeds[1], 15.0, "second tick jumps over the dead zone");
    assert!(
        speeds.iter().all(|s| *s <= 60.0),
        "speed must never exceed the forward limit"
    );
    assert_eq!(state.current_speed(), 60.0);
    assert_eq!(drive.hardware().duty(MotorChannel::Forward), 614);
    assert_eq!(drive.hardware().duty(MotorChannel::Backward), 0);
}

#[test]
fn acceleration_is_paced_by_iterations_not_time() {
    // 5 ms or 200 ms between ticks, the same number of ticks is needed.
    for period in [5u64, 20, 200] {
        let (mut drive, state) = make_drive(60.0, 35.0);
        drive.hardware_mut().press(true, false);
        let mut ticks = 0;
        run_until(&mut drive, 0, period, 500, || {
            ticks += 1;
            state.current_speed() == 60.0
        });
        assert_eq!(ticks, 92, "period {} ms", period);
    }
}

// ── Reverse ───────────────────────────────────────────────────

#[test]
fn backward_pedal_snaps_to_minimum_reverse_then_ramps() {
    let (mut drive, state) = make_drive(60.0, 35.0);
    drive.hardware_mut().press(false, true);

    drive.tick(20).unwrap();
    assert_eq!(state.current_speed(), -0.5);
    drive.tick(40).unwrap();
    assert_eq!(state.current_speed(), -10.0);

    run_until(&mut drive, 40, 20, 100, || false);
    assert_eq!(state.current_speed(), -35.0);
    assert_eq!(drive.hardware().duty(MotorChannel::Forward), 0);
    assert_eq!(drive.hardware().duty(MotorChannel::Backward), 358);
}

#[test]
fn both_pedals_bring_the_car_to_rest() {
    let (mut drive, state) = make_drive(60.0, 35.0);
    let t = cruise(&mut drive, &state);

    drive.hardware_mut().press(true, true);
    run_until(&mut drive, t, 20, 200, || state.current_speed() == 0.0);
    assert_eq!(state.current_speed(), 0.0);
    assert_eq!(state.indicator_period_ms(), 1000);
}

// ── Braking ───────────────────────────────────────────────────

#[test]
fn release_brakes_to_rest_without_reversing() {
    let (mut drive, state) = make_drive(60.0, 35.0);
    let t = cruise(&mut drive, &state);

    drive.hardware_mut().press(false, false);
    let mut previous = state.current_speed();
    let mut now = t;
    while state.current_speed() != 0.0 {
        now += 20;
        drive.tick(now).unwrap();
        let speed = state.current_speed();
        assert!(speed <= previous, "braking must be monotone");
        assert!(speed >= 0.0, "braking must never reverse");
        previous = speed;
        assert!(now - t < 2_000, "still braking after 2 s");
    }
    assert_eq!(drive.hardware().duty(MotorChannel::Forward), 0);
}

#[test]
fn braking_is_paced_by_elapsed_time() {
    let stop_time = |period: u64| {
        let (mut drive, state) = make_drive(60.0, 35.0);
        let t = cruise(&mut drive, &state);
        drive.hardware_mut().press(false, false);
        run_until(&mut drive, t, period, 1_000, || state.current_speed() == 0.0) - t
    };

    let fine = stop_time(10);
    let coarse = stop_time(40);
    for elapsed in [fine, coarse] {
        assert!(
            (950..=1_100).contains(&elapsed),
            "60 → 0 took {} ms",
            elapsed
        );
    }
    assert!(fine.abs_diff(coarse) <= 60);
}

#[test]
fn lowering_the_limit_brakes_down_to_it() {
    let (mut drive, state) = make_drive(60.0, 35.0);
    let t = cruise(&mut drive, &state);

    state.set_limits(30.0, 35.0);
    let mut now = t;
    for _ in 0..100 {
        now += 20;
        drive.tick(now).unwrap();
        assert!(state.current_speed() >= 30.0, "overshot the new limit");
    }
    assert_eq!(state.current_speed(), 30.0);
}

// ── Emergency stop ────────────────────────────────────────────

#[test]
fn emergency_stop_at_speed_zeroes_outputs_on_next_tick() {
    let (mut drive, state) = make_drive(100.0, 35.0);
    drive.hardware_mut().press(true, false);
    let t = run_until(&mut drive, 0, 20, 500, || state.current_speed() >= 80.0);
    assert!(drive.hardware().duty(MotorChannel::Forward) > 0);

    state.set_emergency_stop(true);
    let delay = drive.tick(t + 20).unwrap();

    assert_eq!(delay, Duration::from_millis(50));
    assert_eq!(state.current_speed(), 0.0);
    assert_eq!(drive.hardware().duty(MotorChannel::Forward), 0);
    assert_eq!(drive.hardware().duty(MotorChannel::Backward), 0);
    assert_eq!(state.indicator_period_ms(), 200);

    // Pedal still held: nothing moves while latched.
    run_until(&mut drive, t + 20, 50, 20, || false);
    assert_eq!(state.current_speed(), 0.0);
}

#[test]
fn releasing_emergency_stop_restarts_from_rest() {
    let (mut drive, state) = make_drive(60.0, 35.0);
    let t = cruise(&mut drive, &state);

    state.set_emergency_stop(true);
    drive.tick(t + 20).unwrap();
    state.set_emergency_stop(false);
    let delay = drive.tick(t + 70).unwrap();

    assert_eq!(delay, Duration::from_millis(20));
    assert_eq!(state.current_speed(), 0.5);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn corrupt_stored_limit_never_reverses_the_forward_pedal() {
    let store = MockStore::default();
    store.set_float(KEY_MAX_FORWARD, -20.0).unwrap();
    let config = DriveConfig::default();
    let state = Arc::new(ControlState::load(&store, &config));
    assert_eq!(state.max_forward(), config.default_max_forward);

    let mut drive = DriveLoop::new(MockHardware::new(), Arc::clone(&state), &config, 0);
    drive.hardware_mut().press(true, false);
    for i in 1..=50u64 {
        drive.tick(i * 20).unwrap();
        assert!(state.current_speed() >= 0.0, "forward pedal drove the car backward");
        assert_eq!(drive.hardware().duty(MotorChannel::Backward), 0);
    }
    assert!(drive.hardware().duty(MotorChannel::Forward) > 0);
}

#[test]
fn motor_fault_enters_safe_state_and_reports() {
    let (mut drive, state) = make_drive(60.0, 35.0);
    let t = cruise(&mut drive, &state);

    drive.hardware_mut().fail_motor = true;
    let result = drive.tick(t + 20);

    assert_eq!(result, Err(ActuatorError::ForwardPwmFailed));
    assert!(state.emergency_stop());
    assert_eq!(state.current_speed(), 0.0);
    assert_eq!(drive.hardware().calls.last(), Some(&MotorCall::AllOff));
}

#[test]
fn outputs_stay_in_range_under_erratic_input() {
    let (mut drive, state) = make_drive(60.0, 35.0);
    let max_duty = drive.hardware().max_duty;

    // Small LCG so the sequence is reproducible.
    let mut seed: u32 = 0x2545_F491;
    let mut next = || {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        seed >> 8
    };

    let mut now = 0u64;
    for i in 0..5_000 {
        let r = next();
        drive.hardware_mut().press(r & 1 != 0, r & 2 != 0);
        if i % 500 == 0 {
            state.set_limits((r % 101) as f32, ((r >> 7) % 101) as f32);
        }
        now += u64::from(1 + (r >> 12) % 200);
        drive.tick(now).unwrap();

        let speed = state.current_speed();
        assert!((-100.0..=100.0).contains(&speed), "speed {} escaped", speed);
        let fwd = drive.hardware().duty(MotorChannel::Forward);
        let bwd = drive.hardware().duty(MotorChannel::Backward);
        assert!(fwd == 0 || bwd == 0, "both channels driven at once");
    }
    assert!(drive.hardware().duties().all(|d| d <= max_duty));
}
