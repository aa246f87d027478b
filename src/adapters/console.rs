//! Console transport.
//!
//! A line-oriented stand-in for the observatory pub/sub transport.  Each
//! stdin line is one protocol command:
//!
//! ```text
//!   start Default
//!   enable
//!   applySetpoint 12.5
//!   setValue fanSpeed=40,heater=off
//!   standby
//!   shutdown
//! ```
//!
//! Accepted lines get increasing command ids; acknowledgments are written
//! to the log by [`LogAckPort`].

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, unbounded};
use log::{debug, info, warn};

use crate::app::commands::{Ack, CommandKind, CommandPayload};
use crate::app::ports::{AckPort, CommandSource, InboundCommand};
use crate::error::Result;

/// Parse one console line into a payload.
pub fn parse_line(line: &str) -> core::result::Result<CommandPayload, String> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let payload = match name {
        "boot" => CommandPayload::Boot,
        "update" => CommandPayload::Update,
        "shutdown" => CommandPayload::Shutdown,
        "abort" => CommandPayload::Abort,
        "enable" => CommandPayload::Enable,
        "disable" => CommandPayload::Disable,
        "standby" => CommandPayload::Standby,
        "exitControl" => CommandPayload::ExitControl,
        "enterControl" => CommandPayload::EnterControl,
        "start" => CommandPayload::Start {
            settings_to_apply: rest.to_string(),
        },
        "setValue" => CommandPayload::SetValue {
            parameters_and_values: rest.to_string(),
        },
        "applySetpoint" => {
            let setpoint = rest
                .parse::<f32>()
                .map_err(|_| format!("applySetpoint needs a number, got \"{rest}\""))?;
            CommandPayload::ApplySetpoint { setpoint }
        }
        "" => return Err("empty line".to_string()),
        other => return Err(format!("unknown command \"{other}\"")),
    };
    Ok(payload)
}

/// Logs every acknowledgment.
#[derive(Debug, Default)]
pub struct LogAckPort;

impl AckPort for LogAckPort {
    fn ack(&self, kind: CommandKind, command_id: i32, ack: &Ack) {
        if ack.ack_code() < 0 {
            warn!(
                "ACK | id={} cmd={} ack={} error={} | {}",
                command_id,
                kind,
                ack.ack_code(),
                ack.error_code(),
                ack.description()
            );
        } else {
            info!(
                "ACK | id={} cmd={} ack={} | {}",
                command_id,
                kind,
                ack.ack_code(),
                ack.description()
            );
        }
    }
}

/// [`CommandSource`] fed by text lines.
pub struct ConsoleSource {
    lines: Receiver<String>,
    next_id: i32,
    ack_port: Arc<dyn AckPort>,
}

impl ConsoleSource {
    /// Read from an arbitrary line channel.
    pub fn from_lines(lines: Receiver<String>, ack_port: Arc<dyn AckPort>) -> Self {
        Self {
            lines,
            next_id: 1,
            ack_port,
        }
    }

    /// Read stdin on a detached thread.  The thread ends at EOF; it is
    /// never joined because a blocking stdin read cannot be interrupted.
    pub fn stdin() -> Result<Self> {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("console-stdin".to_string())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                debug!("Console input closed");
            })?;
        Ok(Self::from_lines(rx, Arc::new(LogAckPort)))
    }
}

impl CommandSource for ConsoleSource {
    fn accept_commands(&mut self) -> Vec<InboundCommand> {
        let mut accepted = Vec::new();
        for line in self.lines.try_iter() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(payload) => {
                    accepted.push(InboundCommand {
                        command_id: self.next_id,
                        payload,
                    });
                    self.next_id = self.next_id.wrapping_add(1);
                }
                Err(e) => warn!("Console: {e}"),
            }
        }
        accepted
    }

    fn ack_port(&self) -> Arc<dyn AckPort> {
        self.ack_port.clone()
    }
}
