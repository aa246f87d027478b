//! Mock port adapters for integration tests.
//!
//! Every mock records what it receives behind an `Arc<Mutex<_>>` so tests
//! can keep a handle after the controller has been moved onto the
//! dispatch thread.

use std::sync::{Arc, Mutex, MutexGuard};

use thermalctl::app::commands::{Ack, CommandKind};
use thermalctl::app::events::{AppEvent, ThermalSample};
use thermalctl::app::ports::{
    AckPort, Clock, EventSink, ModelError, ModelFault, TelemetrySink, ThermalModel,
};
use thermalctl::fsm::StateId;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ── Acks ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AckRecord {
    pub kind: CommandKind,
    pub command_id: i32,
    pub ack: Ack,
}

#[derive(Default)]
pub struct RecordingAckPort {
    acks: Mutex<Vec<AckRecord>>,
}

#[allow(dead_code)]
impl RecordingAckPort {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<AckRecord> {
        lock(&self.acks).clone()
    }

    pub fn for_id(&self, command_id: i32) -> Vec<Ack> {
        lock(&self.acks)
            .iter()
            .filter(|r| r.command_id == command_id)
            .map(|r| r.ack.clone())
            .collect()
    }

    pub fn terminal(&self, command_id: i32) -> Option<Ack> {
        self.for_id(command_id).into_iter().find(Ack::is_terminal)
    }
}

impl AckPort for RecordingAckPort {
    fn ack(&self, kind: CommandKind, command_id: i32, ack: &Ack) {
        lock(&self.acks).push(AckRecord {
            kind,
            command_id,
            ack: ack.clone(),
        });
    }
}

// ── Events + telemetry ────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SharedSink {
    pub events: Arc<Mutex<Vec<AppEvent>>>,
    pub samples: Arc<Mutex<Vec<ThermalSample>>>,
}

#[allow(dead_code)]
impl SharedSink {
    pub fn events(&self) -> Vec<AppEvent> {
        lock(&self.events).clone()
    }

    pub fn samples(&self) -> Vec<ThermalSample> {
        lock(&self.samples).clone()
    }

    /// Target states of every `StateChanged` seen so far.
    pub fn transitions(&self) -> Vec<StateId> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for SharedSink {
    fn emit(&mut self, event: &AppEvent) {
        lock(&self.events).push(event.clone());
    }
}

impl TelemetrySink for SharedSink {
    fn publish(&mut self, sample: &ThermalSample) {
        lock(&self.samples).push(sample.clone());
    }
}

// ── Model ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ModelLog {
    pub ticks: u32,
    pub shutdowns: u32,
    pub ingested: Vec<ThermalSample>,
    pub settings: Vec<String>,
    pub faults_raised: usize,
}

#[derive(Clone, Default)]
pub struct MockModel {
    pub log: Arc<Mutex<ModelLog>>,
    pub fault_on_ingest: Option<i32>,
}

#[allow(dead_code)]
impl MockModel {
    pub fn log(&self) -> MutexGuard<'_, ModelLog> {
        lock(&self.log)
    }
}

impl ThermalModel for MockModel {
    fn periodic_tick(&mut self) {
        lock(&self.log).ticks += 1;
    }

    fn trigger_shutdown(&mut self) {
        lock(&self.log).shutdowns += 1;
    }

    fn ingest_thermal_sample(&mut self, sample: &ThermalSample) {
        lock(&self.log).ingested.push(sample.clone());
    }

    fn load_settings(&mut self, label: &str) -> Result<(), ModelError> {
        if label != "Default" {
            return Err(ModelError::UnknownSettings(label.to_string()));
        }
        lock(&self.log).settings.push(label.to_string());
        Ok(())
    }

    fn take_fault(&mut self) -> Option<ModelFault> {
        let code = self.fault_on_ingest?;
        let mut log = lock(&self.log);
        if log.ingested.len() <= log.faults_raised {
            return None;
        }
        log.faults_raised = log.ingested.len();
        Some(ModelFault {
            code,
            report: "mock fault".to_string(),
        })
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now_unix(&self) -> f64 {
        self.0
    }
}
