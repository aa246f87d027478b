//! System configuration parameters
//!
//! All tunable parameters for the thermal controller.
//! Values can be overridden from a JSON file (see
//! [`JsonConfigFile`](crate::adapters::config_file::JsonConfigFile)).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scanner::SCANNER_COUNT;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Thermal scanners ---
    /// Local address the scanner sockets bind to
    pub scanner_bind_ip: String,
    /// One UDP port per physical scanner, in channel order
    pub scanner_ports: [u16; SCANNER_COUNT],
    /// Receive buffer size for one scanner datagram (bytes)
    pub scanner_recv_buffer_bytes: usize,
    /// Scanner socket read timeout (milliseconds); `None` waits forever
    pub scanner_read_timeout_ms: Option<u64>,

    // --- Timing ---
    /// Period of the injected `update` command (milliseconds)
    pub outer_loop_interval_ms: u64,
    /// Transport polling period (milliseconds)
    pub subscriber_interval_ms: u64,
    /// Longest the dispatch task waits on an empty queue before re-checking
    /// its running flag (milliseconds)
    pub dispatch_wake_interval_ms: u64,
    /// How often the bootstrap checks for a shutdown request (milliseconds)
    pub shutdown_poll_interval_ms: u64,

    // --- Model ---
    /// Settings labels accepted by the `start` command
    pub settings_labels: Vec<String>,
    /// Thermocouple reading (Celsius) above which the model latches a fault
    pub max_temperature_c: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Scanners
            scanner_bind_ip: "0.0.0.0".to_string(),
            scanner_ports: [9001, 9002, 9003, 9004],
            scanner_recv_buffer_bytes: 1028,
            scanner_read_timeout_ms: None,

            // Timing
            outer_loop_interval_ms: 1000,  // 1 Hz
            subscriber_interval_ms: 100,   // 10 Hz
            dispatch_wake_interval_ms: 100,
            shutdown_poll_interval_ms: 250,

            // Model
            settings_labels: vec!["Default".to_string()],
            max_temperature_c: 85.0,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outer_loop_interval_ms == 0
            || self.subscriber_interval_ms == 0
            || self.dispatch_wake_interval_ms == 0
            || self.shutdown_poll_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed("intervals must be non-zero"));
        }
        if self.scanner_read_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "scanner_read_timeout_ms must be non-zero when set",
            ));
        }
        if self.scanner_ports.contains(&0) {
            return Err(ConfigError::ValidationFailed("scanner ports must be non-zero"));
        }
        for (i, port) in self.scanner_ports.iter().enumerate() {
            if self.scanner_ports[i + 1..].contains(port) {
                return Err(ConfigError::ValidationFailed("scanner ports must be distinct"));
            }
        }
        // "<id>," plus 95 short readings must fit in one datagram.
        if self.scanner_recv_buffer_bytes < 256 {
            return Err(ConfigError::ValidationFailed(
                "scanner_recv_buffer_bytes too small for a frame",
            ));
        }
        if self.settings_labels.is_empty() {
            return Err(ConfigError::ValidationFailed("settings_labels is empty"));
        }
        if !self.max_temperature_c.is_finite() {
            return Err(ConfigError::ValidationFailed("max_temperature_c must be finite"));
        }
        Ok(())
    }
}
