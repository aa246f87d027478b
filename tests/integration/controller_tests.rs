//! Integration tests for the command → Controller → FSM → ack pipeline.
//!
//! Commands are submitted the way the subscriber task submits them (remote
//! responder, through the queue) and drained synchronously so each step can
//! be asserted in isolation.

use std::sync::Arc;

use crate::mock_ports::{FixedClock, MockModel, RecordingAckPort, SharedSink};

use thermalctl::app::commands::{
    Ack, Command, CommandKind, CommandPayload, FailureReason, ack_code,
};
use thermalctl::app::events::AppEvent;
use thermalctl::app::queue::CommandQueue;
use thermalctl::app::service::Controller;
use thermalctl::fsm::StateId;

struct Rig {
    controller: Controller<MockModel, SharedSink, SharedSink>,
    queue: CommandQueue,
    acks: Arc<RecordingAckPort>,
    sink: SharedSink,
    model: MockModel,
    next_id: i32,
}

impl Rig {
    fn new() -> Self {
        Self::with_model(MockModel::default())
    }

    fn with_model(model: MockModel) -> Self {
        let sink = SharedSink::default();
        let mut controller = Controller::new(
            model.clone(),
            sink.clone(),
            sink.clone(),
            Box::new(FixedClock(1_000.0)),
        );
        controller.start();
        Self {
            controller,
            queue: CommandQueue::new(),
            acks: RecordingAckPort::new(),
            sink,
            model,
            next_id: 100,
        }
    }

    /// Submit through the queue and drain it.  Returns the command id.
    fn submit(&mut self, payload: CommandPayload) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        self.queue
            .enqueue(Command::remote(payload, id, self.acks.clone()));
        while let Some(cmd) = self.queue.try_dequeue() {
            self.controller.execute(cmd);
        }
        id
    }

    fn state_changes(&self) -> usize {
        self.sink
            .events()
            .iter()
            .filter(|e| matches!(e, AppEvent::StateChanged { .. }))
            .count()
    }
}

fn start_default() -> CommandPayload {
    CommandPayload::Start {
        settings_to_apply: "Default".into(),
    }
}

fn channels_1234() -> Vec<Vec<f32>> {
    (1..=4).map(|v| vec![v as f32; 95]).collect()
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_moves_offline_to_standby_with_complete_ack() {
    let mut rig = Rig::new();
    assert_eq!(rig.controller.state(), StateId::Offline);

    let id = rig.submit(CommandPayload::Boot);

    assert_eq!(rig.controller.state(), StateId::Standby);
    assert_eq!(rig.acks.for_id(id), vec![Ack::InProgress, Ack::Complete]);
    assert_eq!(rig.sink.transitions(), vec![StateId::Standby]);
}

// ── Lifecycle walk ────────────────────────────────────────────

#[test]
fn standby_start_enable_disable_standby() {
    let mut rig = Rig::new();
    rig.submit(CommandPayload::Boot);

    let steps = [
        (start_default(), StateId::Disabled),
        (CommandPayload::Enable, StateId::Enabled),
        (CommandPayload::Disable, StateId::Disabled),
        (CommandPayload::Standby, StateId::Standby),
    ];
    for (payload, expected) in steps {
        let before = rig.state_changes();
        let id = rig.submit(payload);
        assert_eq!(rig.controller.state(), expected);
        assert_eq!(rig.state_changes(), before + 1);
        assert_eq!(rig.acks.terminal(id), Some(Ack::Complete));
        assert_eq!(rig.acks.for_id(id).len(), 2);
    }
    assert_eq!(rig.model.log().settings, vec!["Default".to_string()]);
}

#[test]
fn shutdown_from_standby_goes_offline_and_notifies_model() {
    let mut rig = Rig::new();
    rig.submit(CommandPayload::Boot);
    let id = rig.submit(CommandPayload::Shutdown);
    assert_eq!(rig.controller.state(), StateId::Offline);
    assert_eq!(rig.acks.terminal(id), Some(Ack::Complete));
    assert_eq!(rig.model.log().shutdowns, 1);
}

// ── Rejections ────────────────────────────────────────────────

#[test]
fn enable_in_offline_is_invalid_state() {
    let mut rig = Rig::new();
    let id = rig.submit(CommandPayload::Enable);

    assert_eq!(rig.controller.state(), StateId::Offline);
    let ack = rig.acks.terminal(id).unwrap();
    assert_eq!(ack.ack_code(), ack_code::FAILED);
    assert_eq!(ack.error_code(), -320);
    assert_eq!(rig.state_changes(), 0);
}

#[test]
fn three_channel_scan_rejected_before_dispatch() {
    let mut rig = Rig::new();
    rig.submit(CommandPayload::Boot);
    rig.submit(start_default());

    let id = rig.submit(CommandPayload::ScannerData(vec![vec![1.0; 95]; 3]));

    // Only the terminal failure: the command never reached dispatch.
    let acks = rig.acks.for_id(id);
    assert_eq!(acks.len(), 1);
    assert_eq!(acks[0].error_code(), FailureReason::InvalidParameter.code());
    assert!(rig.sink.samples().is_empty());
    assert!(rig.model.log().ingested.is_empty());
    assert_eq!(rig.controller.state(), StateId::Disabled);
}

#[test]
fn start_with_unknown_settings_stays_in_standby() {
    let mut rig = Rig::new();
    rig.submit(CommandPayload::Boot);
    let id = rig.submit(CommandPayload::Start {
        settings_to_apply: "Summit".into(),
    });
    assert_eq!(rig.controller.state(), StateId::Standby);
    assert_eq!(
        rig.acks.terminal(id).map(|a| a.error_code()),
        Some(FailureReason::InvalidParameter.code())
    );
}

#[test]
fn unsupported_protocol_commands_are_rejected_everywhere() {
    let mut rig = Rig::new();
    rig.submit(CommandPayload::Boot);
    rig.submit(start_default());
    rig.submit(CommandPayload::Enable);

    for payload in [
        CommandPayload::Abort,
        CommandPayload::EnterControl,
        CommandPayload::ExitControl,
        CommandPayload::ApplySetpoint { setpoint: 4.0 },
        CommandPayload::SetValue {
            parameters_and_values: "fan=1".into(),
        },
    ] {
        let id = rig.submit(payload);
        assert_eq!(
            rig.acks.terminal(id).map(|a| a.error_code()),
            Some(FailureReason::InvalidState.code())
        );
    }
    assert_eq!(rig.controller.state(), StateId::Enabled);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn scan_in_disabled_is_published_unchanged() {
    let mut rig = Rig::new();
    rig.submit(CommandPayload::Boot);
    rig.submit(start_default());
    let before = rig.state_changes();

    let id = rig.submit(CommandPayload::ScannerData(channels_1234()));

    assert_eq!(rig.acks.terminal(id), Some(Ack::Complete));
    assert_eq!(rig.controller.state(), StateId::Disabled);
    assert_eq!(rig.state_changes(), before);

    let samples = rig.sink.samples();
    assert_eq!(samples.len(), 1);
    assert!((samples[0].timestamp - 1_000.0).abs() < f64::EPSILON);
    for (i, channel) in samples[0].scanners.iter().enumerate() {
        assert_eq!(channel.len(), 95);
        assert!(channel.iter().all(|&r| (r - (i + 1) as f32).abs() < f32::EPSILON));
    }
    assert_eq!(rig.model.log().ingested.len(), 1);
}

#[test]
fn update_never_changes_state() {
    let mut rig = Rig::new();
    rig.submit(CommandPayload::Boot);
    for _ in 0..3 {
        rig.submit(CommandPayload::Update);
    }
    assert_eq!(rig.controller.state(), StateId::Standby);
    assert_eq!(rig.model.log().ticks, 3);
}

// ── Fault path ────────────────────────────────────────────────

#[test]
fn model_fault_forces_fault_and_standby_recovers() {
    let model = MockModel {
        fault_on_ingest: Some(7),
        ..Default::default()
    };
    let mut rig = Rig::with_model(model);
    rig.submit(CommandPayload::Boot);
    rig.submit(start_default());
    rig.submit(CommandPayload::Enable);

    let id = rig.submit(CommandPayload::ScannerData(channels_1234()));
    // The command itself completed; the fault is raised afterwards.
    assert_eq!(rig.acks.terminal(id), Some(Ack::Complete));
    assert_eq!(rig.controller.state(), StateId::Fault);
    assert!(rig
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, AppEvent::FaultDetected { code: 7, .. })));

    let id = rig.submit(CommandPayload::Enable);
    assert_eq!(
        rig.acks.terminal(id).map(|a| a.error_code()),
        Some(FailureReason::InvalidState.code())
    );

    rig.submit(CommandPayload::Standby);
    assert_eq!(rig.controller.state(), StateId::Standby);
    assert_eq!(
        rig.sink.transitions(),
        vec![
            StateId::Standby,
            StateId::Disabled,
            StateId::Enabled,
            StateId::Fault,
            StateId::Standby
        ]
    );
}

#[test]
fn every_ack_carries_its_command_kind() {
    let mut rig = Rig::new();
    rig.submit(CommandPayload::Boot);
    rig.submit(CommandPayload::Disable);
    let kinds: Vec<CommandKind> = rig.acks.all().iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CommandKind::Boot,
            CommandKind::Boot,
            CommandKind::Disable,
            CommandKind::Disable
        ]
    );
}
