//! Dispatch task: the single queue consumer.
//!
//! Commands are applied strictly one at a time, in queue order, each run
//! to completion before the next is popped.  The wait on an empty queue is
//! bounded so the loop can observe its run flag.

use std::time::Duration;

use log::info;

use super::{RunFlag, Task};
use crate::app::ports::{EventSink, TelemetrySink, ThermalModel};
use crate::app::queue::CommandQueue;
use crate::app::service::Controller;
use crate::error::Result;

/// Drain `queue` into `controller` until `flag` is cleared.
pub fn run<M, E, T>(
    queue: &CommandQueue,
    controller: &mut Controller<M, E, T>,
    wake_interval: Duration,
    flag: &RunFlag,
) where
    M: ThermalModel,
    E: EventSink,
    T: TelemetrySink,
{
    while flag.is_running() {
        if let Some(command) = queue.dequeue_timeout(wake_interval) {
            controller.execute(command);
        }
    }
    info!(
        "Dispatch loop exiting after {} commands, {} still queued",
        controller.executed(),
        queue.len()
    );
}

/// Move `controller` onto its own thread.  Joining the task hands it back.
pub fn spawn<M, E, T>(
    queue: CommandQueue,
    mut controller: Controller<M, E, T>,
    wake_interval: Duration,
) -> Result<Task<Controller<M, E, T>>>
where
    M: ThermalModel + Send + 'static,
    E: EventSink + Send + 'static,
    T: TelemetrySink + Send + 'static,
{
    Task::spawn("dispatch", move |flag| {
        run(&queue, &mut controller, wake_interval, &flag);
        controller
    })
}
