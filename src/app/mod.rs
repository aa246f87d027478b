//! Application core: command model, queue and dispatch step.
//!
//! This module contains the rules for the thermal controller: which
//! commands exist, how they are acknowledged, how they are queued, and how
//! one command is applied to the state machine.  All interaction with the
//! transport, the business model and telemetry happens through **port
//! traits** defined in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod queue;
pub mod service;
