//! Outer-loop ticker.
//!
//! Enqueues a fresh `update` on start and then once per interval,
//! regardless of how far behind dispatch is.  Ticks are never coalesced.

use std::thread;
use std::time::Duration;

use super::{RunFlag, Task};
use crate::app::commands::{Command, CommandPayload};
use crate::app::queue::CommandQueue;
use crate::error::Result;

pub fn run(queue: &CommandQueue, interval: Duration, flag: &RunFlag) -> u64 {
    let mut ticks = 0;
    while flag.is_running() {
        if queue.enqueue(Command::internal(CommandPayload::Update)) {
            ticks += 1;
        }
        thread::sleep(interval);
    }
    ticks
}

/// Returns the number of updates enqueued when joined.
pub fn spawn(queue: CommandQueue, interval: Duration) -> Result<Task<u64>> {
    Task::spawn("outer-loop", move |flag| run(&queue, interval, &flag))
}
