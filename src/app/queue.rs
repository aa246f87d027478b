//! The command queue: the only structure shared between tasks.
//!
//! Multi-producer, single-consumer, strictly FIFO and unbounded.  Producers
//! never block; the consumer blocks until a command arrives.  Admission
//! runs [`Command::validate`] so nothing invalid is ever dispatched.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use log::{debug, warn};

use super::commands::{Command, FailureReason};

/// Cloneable handle to the shared queue.
#[derive(Clone)]
pub struct CommandQueue {
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Validate and append `command`.
    ///
    /// An invalid command is acknowledged with invalid-parameter and
    /// dropped.  Returns whether the command was queued.
    pub fn enqueue(&self, mut command: Command) -> bool {
        if let Err(reason) = command.validate() {
            warn!("Rejecting {} before queueing: {}", command.name(), reason);
            command.ack_invalid_parameter(reason);
            return false;
        }
        debug!("Queueing {}", command.name());
        // Both ends live in `self`, so the channel can't be disconnected.
        self.tx.send(command).is_ok()
    }

    /// Block until a command is available and remove it.
    pub fn dequeue(&self) -> Option<Command> {
        self.rx.recv().ok()
    }

    /// Like [`dequeue`](Self::dequeue) but gives up after `timeout`.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<Command> {
        match self.rx.recv_timeout(timeout) {
            Ok(cmd) => Some(cmd),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking pop.
    pub fn try_dequeue(&self) -> Option<Command> {
        match self.rx.try_recv() {
            Ok(cmd) => Some(cmd),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Discard every queued command, acknowledging each as aborted.
    /// Returns how many were discarded.
    pub fn clear(&self) -> usize {
        let mut discarded = 0;
        for mut command in self.rx.try_iter() {
            command.ack_aborted(
                FailureReason::ExecutionBlocked.code(),
                "Command queue cleared",
            );
            discarded += 1;
        }
        if discarded > 0 {
            warn!("Cleared {discarded} queued commands");
        }
        discarded
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
