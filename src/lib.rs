//! Thermal-management controller library.
//!
//! Command/state-machine engine and thermal-scanner ingestion, exposed for
//! the `thermalctl` binary and for integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod scanner;
pub mod tasks;
