//! Unified error types for the thermal controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! bootstrap and task-spawning paths uniform.  Command-level failures are
//! *not* errors in this sense: they are reported back to the submitter as
//! acknowledgments (see [`crate::app::commands::Ack`]) and never escalate.

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation outside the command path funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A thermal-scanner frame could not be decoded.
    Scanner(ScannerError),
    /// A socket or thread operation failed.
    Io(io::ErrorKind),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scanner(e) => write!(f, "scanner: {e}"),
            Self::Io(kind) => write!(f, "io: {kind}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e.kind())
    }
}

// ---------------------------------------------------------------------------
// Scanner frame errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerError {
    /// Datagram payload is not valid UTF-8.
    NotUtf8,
    /// Datagram carried no fields at all.
    EmptyFrame,
    /// Reading at `index` (0-based, scanner id excluded) is not a number.
    BadReading { index: usize },
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotUtf8 => write!(f, "frame is not UTF-8"),
            Self::EmptyFrame => write!(f, "empty frame"),
            Self::BadReading { index } => write!(f, "reading {index} is not numeric"),
        }
    }
}

impl std::error::Error for ScannerError {}

impl From<ScannerError> for Error {
    fn from(e: ScannerError) -> Self {
        Self::Scanner(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from [`ConfigPort`](crate::app::ports::ConfigPort) operations and
/// [`SystemConfig::validate`](crate::config::SystemConfig::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config could not be parsed.
    Corrupted(String),
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying file could not be read or written.
    IoError(io::ErrorKind),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted(msg) => write!(f, "config corrupted: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::IoError(kind) => write!(f, "I/O error: {kind}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
