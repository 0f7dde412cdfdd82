//! End-to-end command flow: listener → CommandChannel → CommandService →
//! ControlState → DriveLoop, with replies fanned back out to every listener.

use std::sync::Arc;

use powerwheel::app::ports::{MotorChannel, StoragePort};
use powerwheel::app::service::CommandService;
use powerwheel::app::state::ControlState;
use powerwheel::config::{DriveConfig, KEY_MAX_BACKWARD, KEY_MAX_FORWARD};
use powerwheel::control::drive::DriveLoop;
use powerwheel::control::telemetry::TelemetryBroadcaster;
use powerwheel::rpc::channel::CommandChannel;
use powerwheel::rpc::inbox::Inbox;
use serde_json::{Value, json};

use crate::mock_hw::{MockHardware, MockStore, RecordingTransport};

struct Rig {
    channel: Arc<CommandChannel<RecordingTransport>>,
    state: Arc<ControlState>,
    store: Arc<MockStore>,
}

/// Shares one store between the service and the test.
struct SharedStore(Arc<MockStore>);

impl StoragePort for SharedStore {
    fn get_float(&self, key: &str, default: f32) -> f32 {
        self.0.get_float(key, default)
    }

    fn set_float(
        &self,
        key: &str,
        value: f32,
    ) -> Result<(), powerwheel::app::ports::StorageError> {
        self.0.set_float(key, value)
    }
}

fn make_rig(listeners: &[u32]) -> Rig {
    let store = Arc::new(MockStore::default());
    let state = Arc::new(ControlState::load(store.as_ref(), &DriveConfig::default()));
    let channel = Arc::new(CommandChannel::new(RecordingTransport::default()));
    channel
        .register_consumer(Arc::new(CommandService::new(
            Arc::clone(&state),
            SharedStore(Arc::clone(&store)),
        )))
        .unwrap();
    for h in listeners {
        channel.connect(*h).unwrap();
    }
    Rig { channel, state, store }
}

fn last_json(rig: &Rig, handle: u32) -> Value {
    let msgs = rig.channel.transport().received_by(handle);
    serde_json::from_str(msgs.last().expect("no message received")).unwrap()
}

// ── update_max ────────────────────────────────────────────────

#[test]
fn update_max_applies_persists_and_notifies_every_listener() {
    let rig = make_rig(&[1, 2, 3]);

    rig.channel.receive(
        r#"{"command":"update_max","parameters":{"max_forward":70,"max_backward":30}}"#,
    );

    assert_eq!(rig.state.max_forward(), 70.0);
    assert_eq!(rig.state.max_backward(), 30.0);
    assert_eq!(rig.store.value(KEY_MAX_FORWARD), Some(70.0));
    assert_eq!(rig.store.value(KEY_MAX_BACKWARD), Some(30.0));

    let expected = json!({
        "current_speed": 0.0,
        "max_forward": 70.0,
        "max_backward": 30.0,
        "emergency_stop": false,
    });
    for h in [1, 2, 3] {
        assert_eq!(last_json(&rig, h), expected, "listener {}", h);
    }
}

#[test]
fn persisted_limits_survive_a_reboot() {
    let rig = make_rig(&[]);
    rig.channel.receive(
        r#"{"command":"update_max","parameters":{"max_forward":45.5,"max_backward":20}}"#,
    );

    let rebooted = ControlState::load(rig.store.as_ref(), &DriveConfig::default());
    assert_eq!(rebooted.max_forward(), 45.5);
    assert_eq!(rebooted.max_backward(), 20.0);
    assert!(!rebooted.emergency_stop());
}

#[test]
fn storage_failure_still_applies_and_broadcasts() {
    let rig = make_rig(&[7]);
    rig.store.fail(true);

    rig.channel.receive(
        r#"{"command":"update_max","parameters":{"max_forward":50,"max_backward":25}}"#,
    );

    assert_eq!(rig.state.max_forward(), 50.0);
    assert_eq!(last_json(&rig, 7)["max_forward"], json!(50.0));
    assert_eq!(rig.store.value(KEY_MAX_FORWARD), None);
}

#[test]
fn rejected_commands_change_nothing_and_send_nothing() {
    let rig = make_rig(&[1]);
    for payload in [
        "not json",
        r#"{"parameters":{}}"#,
        r#"{"command":"update_max"}"#,
        r#"{"command":"update_max","parameters":{"max_forward":"fast","max_backward":30}}"#,
        r#"{"command":"update_max","parameters":{"max_forward":150,"max_backward":30}}"#,
        r#"{"command":"emergency_stop","parameters":{"is_enabled":"yes"}}"#,
        r#"{"command":"self_destruct"}"#,
    ] {
        assert_eq!(rig.channel.receive(payload), 1);
    }

    assert_eq!(rig.state.max_forward(), 60.0);
    assert_eq!(rig.state.max_backward(), 35.0);
    assert!(!rig.state.emergency_stop());
    assert!(rig.channel.transport().received_by(1).is_empty());
}

// ── read / read_throttle ──────────────────────────────────────

#[test]
fn read_reports_live_speed() {
    let rig = make_rig(&[1]);
    rig.state.set_current_speed(-12.5);

    rig.channel.receive(r#"{"command":"read"}"#);

    assert_eq!(last_json(&rig, 1)["current_speed"], json!(-12.5));
}

#[test]
fn read_throttle_reflects_pedal_sampled_by_drive_loop() {
    let rig = make_rig(&[1]);
    let mut drive = DriveLoop::new(
        MockHardware::new(),
        Arc::clone(&rig.state),
        &DriveConfig::default(),
        0,
    );

    drive.tick(20).unwrap();
    rig.channel.receive(r#"{"command":"read_throttle"}"#);
    assert_eq!(last_json(&rig, 1), json!({"current_throttle": 0.0}));

    drive.hardware_mut().press(true, false);
    drive.tick(40).unwrap();
    rig.channel.receive(r#"{"command":"read_throttle"}"#);
    assert_eq!(last_json(&rig, 1), json!({"current_throttle": 1.0}));
}

// ── emergency_stop ────────────────────────────────────────────

#[test]
fn remote_emergency_stop_halts_the_car() {
    let rig = make_rig(&[1, 2]);
    let mut drive = DriveLoop::new(
        MockHardware::new(),
        Arc::clone(&rig.state),
        &DriveConfig::default(),
        0,
    );
    drive.hardware_mut().press(true, false);
    for i in 1..=50u64 {
        drive.tick(i * 20).unwrap();
    }
    assert!(rig.state.current_speed() > 30.0);

    rig.channel
        .receive(r#"{"command":"emergency_stop","parameters":{"is_enabled":true}}"#);
    assert_eq!(last_json(&rig, 2)["emergency_stop"], json!(true));

    drive.tick(1_020).unwrap();
    assert_eq!(rig.state.current_speed(), 0.0);
    assert_eq!(drive.hardware().duty(MotorChannel::Forward), 0);

    rig.channel
        .receive(r#"{"command":"emergency_stop","parameters":{"is_enabled":false}}"#);
    assert!(!rig.state.emergency_stop());
    assert_eq!(last_json(&rig, 1)["emergency_stop"], json!(false));
}

// ── Queued dispatch ───────────────────────────────────────────

#[test]
fn queued_commands_reply_only_when_drained() {
    let rig = make_rig(&[1, 2]);
    let inbox = Inbox::new();

    inbox.push(1, r#"{"command":"emergency_stop","parameters":{"is_enabled":true}}"#).unwrap();
    inbox.push(2, r#"{"command":"read"}"#).unwrap();
    assert!(!rig.state.emergency_stop());
    assert!(rig.channel.transport().sent.lock().unwrap().is_empty());

    assert_eq!(inbox.drain(rig.channel.as_ref()), 2);
    assert!(rig.state.emergency_stop());
    assert_eq!(rig.channel.transport().received_by(1).len(), 2);
    assert_eq!(last_json(&rig, 2)["emergency_stop"], json!(true));
}

// ── Fan-out ───────────────────────────────────────────────────

#[test]
fn dead_listener_is_dropped_and_others_still_get_the_reply() {
    let rig = make_rig(&[1, 2, 3]);
    rig.channel.transport().break_handle(2);

    rig.channel.receive(r#"{"command":"read"}"#);

    assert_eq!(rig.channel.listener_count(), 2);
    assert!(rig.channel.transport().was_closed(2));
    assert_eq!(rig.channel.transport().received_by(1).len(), 1);
    assert_eq!(rig.channel.transport().received_by(3).len(), 1);
}

#[test]
fn telemetry_reaches_listeners_only_on_change() {
    let rig = make_rig(&[1]);
    let mut telemetry = TelemetryBroadcaster::new(Arc::clone(&rig.state));

    assert!(telemetry.step(rig.channel.as_ref()));
    assert!(!telemetry.step(rig.channel.as_ref()));

    rig.state.set_current_speed(15.0);
    assert!(telemetry.step(rig.channel.as_ref()));
    assert_eq!(last_json(&rig, 1), json!({"current_speed": 15.0}));

    rig.state.set_emergency_stop(true);
    rig.state.set_current_speed(0.0);
    assert!(!telemetry.step(rig.channel.as_ref()));
    assert_eq!(rig.channel.transport().received_by(1).len(), 2);
}
