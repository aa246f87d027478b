//! Table-driven command state machine.
//!
//! The transition table is data, not overridden methods:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌──────────┬──────────┬─────────────────────────────────┐   │
//! │  │ StateId  │ on_enter │ handlers[CommandKind]            │   │
//! │  ├──────────┼──────────┼─────────────────────────────────┤   │
//! │  │ Offline  │ fn(ctx)  │ boot                             │   │
//! │  │ Standby  │ fn(ctx)  │ update · start · shutdown        │   │
//! │  │ Disabled │ fn(ctx)  │ update · enable · standby · data │   │
//! │  │ Enabled  │ fn(ctx)  │ update · disable · data          │   │
//! │  │ Fault    │ fn(ctx)  │ update · standby · data          │   │
//! │  └──────────┴──────────┴─────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Fsm::apply`] looks up the current state's handler for the command's
//! kind.  An empty slot rejects the command with invalid-state.  A handler
//! returns [`Transition::Stay`], [`Transition::To`] or a [`Rejection`];
//! a transition runs `on_exit(current)` → pointer update → `on_enter(next)`
//! and publishes exactly one `StateChanged` event, after which the accepted
//! command is acknowledged complete.
//!
//! The machine is owned by the dispatch task.  Nothing else mutates it.

pub mod context;
pub mod states;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use context::FsmContext;
use log::{info, warn};

use crate::app::commands::{Command, CommandKind, FailureReason};
use crate::app::events::AppEvent;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Operational states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Offline = 0,
    Standby = 1,
    Disabled = 2,
    Enabled = 3,
    Fault = 4,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 5;

    pub const ALL: [StateId; Self::COUNT] = [
        Self::Offline,
        Self::Standby,
        Self::Disabled,
        Self::Enabled,
        Self::Fault,
    ];

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Fault` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Offline,
            1 => Self::Standby,
            2 => Self::Disabled,
            3 => Self::Enabled,
            4 => Self::Fault,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Fault
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Offline => "Offline",
            Self::Standby => "Standby",
            Self::Disabled => "Disabled",
            Self::Enabled => "Enabled",
            Self::Fault => "Fault",
        }
    }

    /// Summary-state code published to the observatory event bus.
    pub const fn summary_state(self) -> u8 {
        match self {
            Self::Disabled => 1,
            Self::Enabled => 2,
            Self::Fault => 3,
            Self::Offline => 4,
            Self::Standby => 5,
        }
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only snapshot of the machine's state for other threads.
///
/// Updated inside every transition, before the triggering command's
/// terminal ack goes out.
#[derive(Debug, Clone)]
pub struct StateWatch(Arc<AtomicU8>);

impl StateWatch {
    fn new(state: StateId) -> Self {
        Self(Arc::new(AtomicU8::new(state as u8)))
    }

    fn set(&self, state: StateId) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub fn get(&self) -> StateId {
        StateId::from_index(self.0.load(Ordering::Acquire) as usize)
    }
}

// ---------------------------------------------------------------------------
// Handler results
// ---------------------------------------------------------------------------

/// Outcome of an accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Work done; stay in the current state.
    Stay,
    /// Work done; move to the given state.
    To(StateId),
}

/// A handler declined the command.  Sent back as a `failed` ack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: FailureReason,
    pub text: String,
}

impl Rejection {
    pub fn new(reason: FailureReason, text: impl Into<String>) -> Self {
        Self {
            reason,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Runs once when a state is entered or exited.
pub type StateActionFn = fn(&mut FsmContext<'_>);

/// Handles one command kind in one state.
pub type CommandHandlerFn = fn(&Command, &mut FsmContext<'_>) -> Result<Transition, Rejection>;

/// One row of handler slots, indexed by [`CommandKind::index`].
pub type HandlerRow = [Option<CommandHandlerFn>; CommandKind::COUNT];

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub handlers: HandlerRow,
}

impl StateDescriptor {
    pub fn handler(&self, kind: CommandKind) -> Option<CommandHandlerFn> {
        self.handlers[kind.index()]
    }
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Commands applied since construction, accepted or not.
    applied: u64,
    transitions: u64,
    watch: StateWatch,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial as usize,
            applied: 0,
            transitions: 0,
            watch: StateWatch::new(initial),
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut FsmContext<'_>) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Apply one command and acknowledge its terminal outcome.
    ///
    /// Returns the new state if the command caused a transition.
    pub fn apply(&mut self, command: &mut Command, ctx: &mut FsmContext<'_>) -> Option<StateId> {
        self.applied += 1;
        let state = &self.table[self.current];

        let Some(handler) = state.handler(command.kind()) else {
            let text = format!("Command is not valid in the {} state.", state.name);
            warn!("{}: {}", command.name(), text);
            command.ack_invalid_state(&text);
            return None;
        };

        match handler(command, ctx) {
            Ok(Transition::Stay) => {
                command.ack_complete();
                None
            }
            Ok(Transition::To(next)) => {
                self.transition(next, ctx);
                command.ack_complete();
                Some(next)
            }
            Err(rejection) => {
                command.ack_failure(rejection.reason, &rejection.text);
                None
            }
        }
    }

    /// Jump straight to `next` regardless of the table (fault path).
    /// No-op if already there.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext<'_>) -> bool {
        if next as usize == self.current {
            return false;
        }
        self.transition(next, ctx);
        true
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// A handle other threads can poll for the current state.
    pub fn watch(&self) -> StateWatch {
        self.watch.clone()
    }

    pub fn commands_applied(&self) -> u64 {
        self.applied
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext<'_>) {
        let from = self.current_state();
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.transitions += 1;
        self.watch.set(next_id);

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }

        ctx.events.emit(&AppEvent::StateChanged { from, to: next_id });
    }
}
