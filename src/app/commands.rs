//! Inbound commands and the acknowledgment protocol.
//!
//! A [`Command`] is a typed unit of work.  Producers (transport subscriber,
//! outer-loop ticker, scanner ingestion) build one, the
//! [`CommandQueue`](super::queue::CommandQueue) validates it, and the
//! dispatch task applies it to the state machine.  Every command carries a
//! [`Responder`] through which it reports back to whoever submitted it:
//!
//! ```text
//!  submitted ──▶ validated ──▶ queued ──▶ in-progress ──▶ terminal ack
//!                    │
//!                    └──[invalid]──▶ failed (-321), never queued
//! ```
//!
//! At most one in-progress ack and exactly one terminal ack are sent.

use std::sync::Arc;

use log::{debug, info, warn};

use super::ports::AckPort;
use crate::scanner::{SCANNER_CHANNEL_LEN, SCANNER_COUNT};

// ───────────────────────────────────────────────────────────────
// Command kinds
// ───────────────────────────────────────────────────────────────

/// Every command the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    Boot = 0,
    Update = 1,
    ApplySetpoint = 2,
    Shutdown = 3,
    Abort = 4,
    Enable = 5,
    Disable = 6,
    Standby = 7,
    ExitControl = 8,
    Start = 9,
    EnterControl = 10,
    SetValue = 11,
    ScannerData = 12,
}

impl CommandKind {
    /// Total number of kinds; sizes the per-state handler tables.
    pub const COUNT: usize = 13;

    pub const ALL: [CommandKind; Self::COUNT] = [
        Self::Boot,
        Self::Update,
        Self::ApplySetpoint,
        Self::Shutdown,
        Self::Abort,
        Self::Enable,
        Self::Disable,
        Self::Standby,
        Self::ExitControl,
        Self::Start,
        Self::EnterControl,
        Self::SetValue,
        Self::ScannerData,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Protocol spelling of the command.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Update => "update",
            Self::ApplySetpoint => "applySetpoint",
            Self::Shutdown => "shutdown",
            Self::Abort => "abort",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Standby => "standby",
            Self::ExitControl => "exitControl",
            Self::Start => "start",
            Self::EnterControl => "enterControl",
            Self::SetValue => "setValue",
            Self::ScannerData => "scannerData",
        }
    }

    /// Kinds a transport may deliver.  Boot, update and scanner data are
    /// only ever produced inside the process.
    pub const fn is_external(self) -> bool {
        !matches!(self, Self::Boot | Self::Update | Self::ScannerData)
    }
}

impl core::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// Payloads
// ───────────────────────────────────────────────────────────────

/// Kind plus kind-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
    Boot,
    Update,
    ApplySetpoint { setpoint: f32 },
    Shutdown,
    Abort,
    Enable,
    Disable,
    Standby,
    ExitControl,
    Start { settings_to_apply: String },
    EnterControl,
    SetValue { parameters_and_values: String },
    /// One reading vector per scanner, in scanner order.
    ScannerData(Vec<Vec<f32>>),
}

impl CommandPayload {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Boot => CommandKind::Boot,
            Self::Update => CommandKind::Update,
            Self::ApplySetpoint { .. } => CommandKind::ApplySetpoint,
            Self::Shutdown => CommandKind::Shutdown,
            Self::Abort => CommandKind::Abort,
            Self::Enable => CommandKind::Enable,
            Self::Disable => CommandKind::Disable,
            Self::Standby => CommandKind::Standby,
            Self::ExitControl => CommandKind::ExitControl,
            Self::Start { .. } => CommandKind::Start,
            Self::EnterControl => CommandKind::EnterControl,
            Self::SetValue { .. } => CommandKind::SetValue,
            Self::ScannerData(_) => CommandKind::ScannerData,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Acknowledgments
// ───────────────────────────────────────────────────────────────

/// Protocol ack codes.
pub mod ack_code {
    pub const IN_PROGRESS: i32 = 301;
    pub const COMPLETE: i32 = 303;
    pub const NOT_PERMITTED: i32 = -300;
    pub const FAILED: i32 = -302;
    pub const ABORTED: i32 = -303;
}

/// Canonical failure reasons, each sent as a `Failed` ack with a fixed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum FailureReason {
    InvalidState = -320,
    InvalidParameter = -321,
    AlreadyInProgress = -322,
    ExecutionBlocked = -323,
    AlreadyInState = -324,
}

impl FailureReason {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// One acknowledgment outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    InProgress,
    Complete,
    NotPermitted { error_code: i32, text: String },
    Aborted { error_code: i32, text: String },
    Failed { error_code: i32, text: String },
}

impl Ack {
    /// Shorthand for one of the canonical failures.
    pub fn failure(reason: FailureReason, text: impl Into<String>) -> Self {
        Self::Failed {
            error_code: reason.code(),
            text: text.into(),
        }
    }

    pub fn ack_code(&self) -> i32 {
        match self {
            Self::InProgress => ack_code::IN_PROGRESS,
            Self::Complete => ack_code::COMPLETE,
            Self::NotPermitted { .. } => ack_code::NOT_PERMITTED,
            Self::Aborted { .. } => ack_code::ABORTED,
            Self::Failed { .. } => ack_code::FAILED,
        }
    }

    pub fn error_code(&self) -> i32 {
        match self {
            Self::InProgress | Self::Complete => 0,
            Self::NotPermitted { error_code, .. }
            | Self::Aborted { error_code, .. }
            | Self::Failed { error_code, .. } => *error_code,
        }
    }

    /// Free-text description as sent on the wire.
    pub fn description(&self) -> String {
        match self {
            Self::InProgress => "In-Progress".to_string(),
            Self::Complete => "Complete".to_string(),
            Self::NotPermitted { text, .. } => format!("Not Permitted: {text}"),
            Self::Aborted { text, .. } => format!("Aborted: {text}"),
            Self::Failed { text, .. } => format!("Failed: {text}"),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

// ───────────────────────────────────────────────────────────────
// Responder
// ───────────────────────────────────────────────────────────────

/// Where a command's acknowledgments go.
#[derive(Clone)]
pub enum Responder {
    /// Produced inside the process; acks are only logged.
    Internal,
    /// Accepted from a transport; acks are routed back by command id.
    Remote {
        command_id: i32,
        port: Arc<dyn AckPort>,
    },
}

impl core::fmt::Debug for Responder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Internal => f.write_str("Internal"),
            Self::Remote { command_id, .. } => write!(f, "Remote({command_id})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AckProgress {
    None,
    InProgress,
    Terminal,
}

// ───────────────────────────────────────────────────────────────
// Command
// ───────────────────────────────────────────────────────────────

/// A validated-on-admission unit of work with its acknowledgment capability.
#[derive(Debug)]
pub struct Command {
    payload: CommandPayload,
    responder: Responder,
    progress: AckProgress,
}

impl Command {
    /// A command produced inside the process (boot, update, scanner data).
    pub fn internal(payload: CommandPayload) -> Self {
        Self::with_responder(payload, Responder::Internal)
    }

    /// A command accepted from a transport under `command_id`.
    pub fn remote(payload: CommandPayload, command_id: i32, port: Arc<dyn AckPort>) -> Self {
        Self::with_responder(payload, Responder::Remote { command_id, port })
    }

    pub fn with_responder(payload: CommandPayload, responder: Responder) -> Self {
        debug!("Creating command {}.", payload.kind());
        Self {
            payload,
            responder,
            progress: AckProgress::None,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.payload.kind()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    /// Transport command id, if any.
    pub fn command_id(&self) -> Option<i32> {
        match &self.responder {
            Responder::Internal => None,
            Responder::Remote { command_id, .. } => Some(*command_id),
        }
    }

    /// Whether the terminal acknowledgment has already been sent.
    pub fn is_acknowledged(&self) -> bool {
        self.progress == AckProgress::Terminal
    }

    /// Check the payload before admission to the queue.
    /// Returns the rejection text on failure.
    pub fn validate(&self) -> Result<(), &'static str> {
        match &self.payload {
            CommandPayload::ScannerData(channels) => {
                if channels.len() != SCANNER_COUNT
                    || channels.iter().any(|c| c.len() != SCANNER_CHANNEL_LEN)
                {
                    return Err("Scanner data must contain 4 channels of 95 readings");
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // ── Acknowledgments ───────────────────────────────────────

    pub fn ack_in_progress(&mut self) {
        debug!("Sending {} ack command in progress.", self.name());
        self.ack(Ack::InProgress);
    }

    pub fn ack_complete(&mut self) {
        info!("Sending {} ack command completed.", self.name());
        self.ack(Ack::Complete);
    }

    pub fn ack_not_permitted(&mut self, error_code: i32, text: &str) {
        warn!(
            "Sending {} ack command not permitted. Error code {}. {}",
            self.name(),
            error_code,
            text
        );
        self.ack(Ack::NotPermitted {
            error_code,
            text: text.to_string(),
        });
    }

    pub fn ack_aborted(&mut self, error_code: i32, text: &str) {
        warn!(
            "Sending {} ack command aborted. Error code {}. {}",
            self.name(),
            error_code,
            text
        );
        self.ack(Ack::Aborted {
            error_code,
            text: text.to_string(),
        });
    }

    pub fn ack_failed(&mut self, error_code: i32, text: &str) {
        warn!(
            "Sending {} ack command failed. Error code {}. {}",
            self.name(),
            error_code,
            text
        );
        self.ack(Ack::Failed {
            error_code,
            text: text.to_string(),
        });
    }

    /// Send one of the canonical failures.
    pub fn ack_failure(&mut self, reason: FailureReason, text: &str) {
        warn!("Sending {} ack command {:?}. {}", self.name(), reason, text);
        self.ack(Ack::failure(reason, text));
    }

    pub fn ack_invalid_state(&mut self, text: &str) {
        self.ack_failure(FailureReason::InvalidState, text);
    }

    pub fn ack_invalid_parameter(&mut self, text: &str) {
        self.ack_failure(FailureReason::InvalidParameter, text);
    }

    pub fn ack_already_in_progress(&mut self, text: &str) {
        self.ack_failure(FailureReason::AlreadyInProgress, text);
    }

    pub fn ack_execution_blocked(&mut self, text: &str) {
        self.ack_failure(FailureReason::ExecutionBlocked, text);
    }

    pub fn ack_already_in_state(&mut self, text: &str) {
        self.ack_failure(FailureReason::AlreadyInState, text);
    }

    fn ack(&mut self, ack: Ack) {
        match (self.progress, ack.is_terminal()) {
            (AckProgress::Terminal, _) => {
                warn!(
                    "Dropping {:?} for {}: command already acknowledged.",
                    ack,
                    self.name()
                );
                return;
            }
            (AckProgress::InProgress, false) => {
                debug!("{} already reported in progress.", self.name());
                return;
            }
            (_, true) => self.progress = AckProgress::Terminal,
            (_, false) => self.progress = AckProgress::InProgress,
        }

        if let Responder::Remote { command_id, port } = &self.responder {
            port.ack(self.payload.kind(), *command_id, &ack);
        }
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        if self.progress != AckProgress::Terminal
            && matches!(self.responder, Responder::Remote { .. })
        {
            self.ack_aborted(
                FailureReason::ExecutionBlocked.code(),
                "Command discarded before completion",
            );
        }
    }
}
