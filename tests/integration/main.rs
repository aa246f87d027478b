//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below exercises one subsystem against the mock ports in
//! [`mock_ports`].  Everything runs on loopback with no scanners attached.

mod controller_tests;
mod mock_ports;
mod queue_tests;
mod scanner_tests;
