//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   CommandSource ──▶ CommandQueue ──▶ Controller ──▶ EventSink / TelemetrySink
//!                                          │
//!                                          └──▶ ThermalModel
//! ```
//!
//! The transport, the business model and the telemetry publisher are
//! collaborators outside this crate's core.  Adapters implement these
//! traits; the [`Controller`](super::service::Controller) consumes them via
//! generics so every path is testable with mocks.

use core::fmt;

use crate::config::SystemConfig;
use crate::error::ConfigError;

use super::commands::{Ack, CommandKind, CommandPayload};
use super::events::{AppEvent, ThermalSample};

// ───────────────────────────────────────────────────────────────
// Acknowledgment port (domain → transport)
// ───────────────────────────────────────────────────────────────

/// Routes an acknowledgment back to the transport that accepted a command.
///
/// Called from the dispatch thread, and from producer threads when a
/// command is rejected at admission, so implementations must be `Sync`.
pub trait AckPort: Send + Sync {
    fn ack(&self, kind: CommandKind, command_id: i32, ack: &Ack);
}

// ───────────────────────────────────────────────────────────────
// Command source (transport → domain)
// ───────────────────────────────────────────────────────────────

/// A protocol command accepted by the transport, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundCommand {
    /// Transport-assigned id used for every acknowledgment.
    pub command_id: i32,
    pub payload: CommandPayload,
}

/// Polled by the subscriber task at a fixed interval.
pub trait CommandSource: Send {
    /// Every command accepted since the previous poll.  Must not block for
    /// longer than one poll interval.
    fn accept_commands(&mut self) -> Vec<InboundCommand>;

    /// Where acknowledgments for this source's commands go.
    fn ack_port(&self) -> std::sync::Arc<dyn AckPort>;
}

// ───────────────────────────────────────────────────────────────
// Event and telemetry sinks (domain → logging / publisher)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Receives one [`ThermalSample`] per dispatched `scannerData` command.
pub trait TelemetrySink {
    fn publish(&mut self, sample: &ThermalSample);
}

// ───────────────────────────────────────────────────────────────
// Thermal model (domain → business logic)
// ───────────────────────────────────────────────────────────────

/// A condition the model raises that forces the controller into Fault.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFault {
    pub code: i32,
    pub report: String,
}

/// Errors from [`ThermalModel`] lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// `start` named a settings label the model does not know.
    UnknownSettings(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSettings(label) => write!(f, "unknown settings \"{label}\""),
        }
    }
}

/// The thermal business model.  Every call is synchronous and fast; it
/// runs on the dispatch thread between commands.
pub trait ThermalModel {
    /// Periodic work driven by the `update` command.
    fn periodic_tick(&mut self);

    /// Begin process shutdown.
    fn trigger_shutdown(&mut self);

    /// Apply one four-channel scan.
    fn ingest_thermal_sample(&mut self, sample: &ThermalSample);

    /// Load the named settings before leaving Standby.
    fn load_settings(&mut self, label: &str) -> Result<(), ModelError>;

    /// Take a latched fault, if any.  Polled after every command.
    fn take_fault(&mut self) -> Option<ModelFault> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for telemetry timestamps.
pub trait Clock: Send {
    /// Seconds since the Unix epoch.
    fn now_unix(&self) -> f64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations validate before persisting; invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}
