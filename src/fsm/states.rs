//! Concrete command handlers and table builder.
//!
//! Each state is a row of plain `fn` pointers, one slot per command kind.
//! Empty slots reject with invalid-state.
//!
//! ```text
//!  OFFLINE ──[boot]──▶ STANDBY ──[start]──▶ DISABLED ──[enable]──▶ ENABLED
//!     ▲                 │  ▲                  │   ▲                   │
//!     └───[shutdown]────┘  └────[standby]─────┘   └─────[disable]─────┘
//!
//!  Any state ──[model fault]──▶ FAULT ──[standby]──▶ STANDBY
//! ```
//!
//! `update` runs periodic model work in every state but Offline;
//! `scannerData` is applied in Disabled, Enabled and Fault.

use log::{debug, error, info};

use super::context::FsmContext;
use super::{CommandHandlerFn, HandlerRow, Rejection, StateDescriptor, StateId, Transition};
use crate::app::commands::{Command, CommandKind, CommandPayload, FailureReason};
use crate::app::events::ThermalSample;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

fn row(entries: &[(CommandKind, CommandHandlerFn)]) -> HandlerRow {
    let mut handlers: HandlerRow = [None; CommandKind::COUNT];
    for &(kind, handler) in entries {
        handlers[kind.index()] = Some(handler);
    }
    handlers
}

/// Build the state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    use CommandKind as K;
    [
        // 0: Offline
        StateDescriptor {
            id: StateId::Offline,
            name: "Offline",
            on_enter: Some(offline_enter),
            on_exit: None,
            handlers: row(&[(K::Boot, boot)]),
        },
        // 1: Standby
        StateDescriptor {
            id: StateId::Standby,
            name: "Standby",
            on_enter: None,
            on_exit: None,
            handlers: row(&[(K::Update, update), (K::Start, start), (K::Shutdown, shutdown)]),
        },
        // 2: Disabled
        StateDescriptor {
            id: StateId::Disabled,
            name: "Disabled",
            on_enter: None,
            on_exit: None,
            handlers: row(&[
                (K::Update, update),
                (K::Enable, enable),
                (K::Standby, standby),
                (K::ScannerData, scanner_data),
            ]),
        },
        // 3: Enabled
        StateDescriptor {
            id: StateId::Enabled,
            name: "Enabled",
            on_enter: Some(enabled_enter),
            on_exit: Some(enabled_exit),
            handlers: row(&[
                (K::Update, update),
                (K::Disable, disable),
                (K::ScannerData, scanner_data),
            ]),
        },
        // 4: Fault
        StateDescriptor {
            id: StateId::Fault,
            name: "Fault",
            on_enter: Some(fault_enter),
            on_exit: Some(fault_exit),
            handlers: row(&[
                (K::Update, update),
                (K::Standby, standby),
                (K::ScannerData, scanner_data),
            ]),
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Entry / exit actions
// ═══════════════════════════════════════════════════════════════════════════

fn offline_enter(_ctx: &mut FsmContext<'_>) {
    info!("OFFLINE: waiting for boot");
}

fn enabled_enter(_ctx: &mut FsmContext<'_>) {
    info!("ENABLED: thermal control active");
}

fn enabled_exit(_ctx: &mut FsmContext<'_>) {
    info!("ENABLED: thermal control released");
}

fn fault_enter(_ctx: &mut FsmContext<'_>) {
    error!("FAULT: thermal control halted, send standby to recover");
}

fn fault_exit(_ctx: &mut FsmContext<'_>) {
    info!("FAULT: recovery requested");
}

// ═══════════════════════════════════════════════════════════════════════════
//  Lifecycle commands
// ═══════════════════════════════════════════════════════════════════════════

fn boot(_cmd: &Command, _ctx: &mut FsmContext<'_>) -> Result<Transition, Rejection> {
    Ok(Transition::To(StateId::Standby))
}

fn start(cmd: &Command, ctx: &mut FsmContext<'_>) -> Result<Transition, Rejection> {
    let CommandPayload::Start { settings_to_apply } = cmd.payload() else {
        return Err(unexpected_payload(cmd));
    };
    ctx.model
        .load_settings(settings_to_apply)
        .map_err(|e| Rejection::new(FailureReason::InvalidParameter, e.to_string()))?;
    info!("Settings \"{settings_to_apply}\" loaded");
    Ok(Transition::To(StateId::Disabled))
}

fn shutdown(_cmd: &Command, ctx: &mut FsmContext<'_>) -> Result<Transition, Rejection> {
    ctx.model.trigger_shutdown();
    Ok(Transition::To(StateId::Offline))
}

fn enable(_cmd: &Command, _ctx: &mut FsmContext<'_>) -> Result<Transition, Rejection> {
    Ok(Transition::To(StateId::Enabled))
}

fn disable(_cmd: &Command, _ctx: &mut FsmContext<'_>) -> Result<Transition, Rejection> {
    Ok(Transition::To(StateId::Disabled))
}

fn standby(_cmd: &Command, _ctx: &mut FsmContext<'_>) -> Result<Transition, Rejection> {
    Ok(Transition::To(StateId::Standby))
}

// ═══════════════════════════════════════════════════════════════════════════
//  Periodic work and telemetry
// ═══════════════════════════════════════════════════════════════════════════

fn update(_cmd: &Command, ctx: &mut FsmContext<'_>) -> Result<Transition, Rejection> {
    ctx.model.periodic_tick();
    Ok(Transition::Stay)
}

fn scanner_data(cmd: &Command, ctx: &mut FsmContext<'_>) -> Result<Transition, Rejection> {
    let CommandPayload::ScannerData(channels) = cmd.payload() else {
        return Err(unexpected_payload(cmd));
    };
    let sample = ThermalSample::from_channels(ctx.clock.now_unix(), channels).ok_or_else(|| {
        Rejection::new(
            FailureReason::InvalidParameter,
            "Scanner data must contain 4 channels of 95 readings",
        )
    })?;

    debug!("Applying thermal sample at {:.3}", sample.timestamp);
    ctx.model.ingest_thermal_sample(&sample);
    ctx.telemetry.publish(&sample);
    Ok(Transition::Stay)
}

fn unexpected_payload(cmd: &Command) -> Rejection {
    Rejection::new(
        FailureReason::InvalidParameter,
        format!("Unexpected payload for {}", cmd.name()),
    )
}
