//! Application service: the hexagonal core.
//!
//! [`Controller`] owns the FSM, the thermal model, the sinks and the clock.
//! One call to [`Controller::execute`] is one step of the dispatch loop:
//!
//! ```text
//!                 ┌──────────────────────────┐ ──▶ EventSink
//!  Command ──────▶│        Controller         │ ──▶ TelemetrySink
//!                 │  in-progress · FSM · fault│
//!                 └──────────────────────────┘ ──▶ ThermalModel
//! ```
//!
//! The controller is moved into the dispatch task and never shared.  Other
//! threads observe the current state through a [`StateWatch`].

use log::{error, info};

use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

pub use crate::fsm::StateWatch;

use super::commands::Command;
use super::events::AppEvent;
use super::ports::{Clock, EventSink, TelemetrySink, ThermalModel};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<M, E, T> {
    fsm: Fsm,
    model: M,
    events: E,
    telemetry: T,
    clock: Box<dyn Clock>,
    executed: u64,
    faults: u64,
}

impl<M, E, T> Controller<M, E, T>
where
    M: ThermalModel,
    E: EventSink,
    T: TelemetrySink,
{
    /// Construct in Offline.  Call [`start`](Self::start) before the
    /// first command.
    pub fn new(model: M, events: E, telemetry: T, clock: Box<dyn Clock>) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Offline),
            model,
            events,
            telemetry,
            clock,
            executed: 0,
            faults: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self) {
        let (fsm, mut ctx) = self.split();
        fsm.start(&mut ctx);
        let state = self.fsm.current_state();
        self.events.emit(&AppEvent::Started(state));
        info!("Controller started in {:?}", state);
    }

    // ── Dispatch step ─────────────────────────────────────────

    /// Run one command to completion: in-progress ack, FSM apply, then
    /// the model's fault check.
    pub fn execute(&mut self, mut command: Command) {
        self.executed += 1;
        command.ack_in_progress();

        let (fsm, mut ctx) = self.split();
        fsm.apply(&mut command, &mut ctx);

        if let Some(fault) = ctx.model.take_fault() {
            error!("Model fault {}: {}", fault.code, fault.report);
            ctx.events.emit(&AppEvent::FaultDetected {
                code: fault.code,
                report: fault.report,
            });
            fsm.force_transition(StateId::Fault, &mut ctx);
            self.faults += 1;
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// A handle other threads can poll for the current state.
    pub fn state_watch(&self) -> StateWatch {
        self.fsm.watch()
    }

    /// Commands executed since startup.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Faults that forced the controller into Fault.
    pub fn fault_count(&self) -> u64 {
        self.faults
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    // ── Internal ──────────────────────────────────────────────

    fn split(&mut self) -> (&mut Fsm, FsmContext<'_>) {
        (
            &mut self.fsm,
            FsmContext::new(
                &mut self.model,
                &mut self.events,
                &mut self.telemetry,
                self.clock.as_ref(),
            ),
        )
    }
}
