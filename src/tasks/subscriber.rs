//! Transport subscriber.
//!
//! Polls the [`CommandSource`] at a fixed interval and turns every accepted
//! protocol message into a [`Command`] that acknowledges back to the
//! transport's command id.  Kinds the transport may not send (boot, update,
//! scanner data) are answered not-permitted and never queued.

use std::thread;
use std::time::Duration;

use log::debug;

use super::{RunFlag, Task};
use crate::app::commands::{Command, FailureReason};
use crate::app::ports::CommandSource;
use crate::app::queue::CommandQueue;
use crate::error::Result;

/// One poll.  Returns how many commands were queued.
pub fn poll_once(source: &mut dyn CommandSource, queue: &CommandQueue) -> usize {
    let ack_port = source.ack_port();
    let mut queued = 0;
    for inbound in source.accept_commands() {
        let kind = inbound.payload.kind();
        debug!("Accepted {} (id {})", kind, inbound.command_id);
        let mut command = Command::remote(inbound.payload, inbound.command_id, ack_port.clone());
        if !kind.is_external() {
            command.ack_not_permitted(
                FailureReason::ExecutionBlocked.code(),
                &format!("{kind} cannot be sent by a transport"),
            );
            continue;
        }
        if queue.enqueue(command) {
            queued += 1;
        }
    }
    queued
}

pub fn run(source: &mut dyn CommandSource, queue: &CommandQueue, interval: Duration, flag: &RunFlag) {
    while flag.is_running() {
        poll_once(source, queue);
        thread::sleep(interval);
    }
}

pub fn spawn<S>(mut source: S, queue: CommandQueue, interval: Duration) -> Result<Task>
where
    S: CommandSource + 'static,
{
    Task::spawn("subscriber", move |flag| {
        run(&mut source, &queue, interval, &flag);
    })
}
