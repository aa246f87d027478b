//! Collaborators threaded through every FSM handler.
//!
//! `FsmContext` borrows the model, the sinks and the clock for the duration
//! of one command.  States carry no data of their own; everything mutable
//! lives behind these references, owned by the dispatch task.

use crate::app::ports::{Clock, EventSink, TelemetrySink, ThermalModel};

/// The context passed to every state handler function.
pub struct FsmContext<'a> {
    /// Business model invoked by `update`, `start`, `shutdown` and `scannerData`.
    pub model: &'a mut dyn ThermalModel,
    /// Receives `StateChanged` on every transition.
    pub events: &'a mut dyn EventSink,
    /// Receives one thermal sample per dispatched `scannerData`.
    pub telemetry: &'a mut dyn TelemetrySink,
    /// Wall clock for telemetry timestamps.
    pub clock: &'a dyn Clock,
}

impl<'a> FsmContext<'a> {
    pub fn new(
        model: &'a mut dyn ThermalModel,
        events: &'a mut dyn EventSink,
        telemetry: &'a mut dyn TelemetrySink,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            model,
            events,
            telemetry,
            clock,
        }
    }
}
