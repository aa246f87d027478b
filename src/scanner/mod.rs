//! Thermal-scanner ingestion protocol.
//!
//! Each of the four scanners sends one UDP datagram per scan:
//!
//! ```text
//!   <scanner-id>,<r0>,<r1>, ... ,<r94>\n
//! ```
//!
//! UTF-8 text, comma-separated.  The id field is not used for routing; the
//! socket a frame arrives on decides its channel.  Readings are parsed as
//! `f32` here but the *count* is checked later, when the four channels are
//! bundled into a `scannerData` command (see
//! [`Command::validate`](crate::app::commands::Command::validate)).

pub mod assembler;
pub mod client;

use crate::error::ScannerError;

/// Number of physical scanners.
pub const SCANNER_COUNT: usize = 4;

/// Readings per scanner channel (id field excluded).
pub const SCANNER_CHANNEL_LEN: usize = 95;

/// One decoded datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerFrame {
    /// Identifier sent by the device.  Informational only.
    pub scanner_id: String,
    pub readings: Vec<f32>,
}

/// Decode one scanner datagram.
///
/// Trailing whitespace (the device terminates frames with a newline) is
/// trimmed before splitting.  Every field after the id must parse as a
/// float.
pub fn parse_frame(data: &[u8]) -> Result<ScannerFrame, ScannerError> {
    let text = core::str::from_utf8(data).map_err(|_| ScannerError::NotUtf8)?;
    let text = text.trim_end_matches(['\0', '\r', '\n', ' ', '\t']);
    if text.is_empty() {
        return Err(ScannerError::EmptyFrame);
    }

    let mut fields = text.split(',');
    let scanner_id = fields.next().unwrap_or_default().trim().to_string();

    let readings = fields
        .enumerate()
        .map(|(index, field)| {
            field
                .trim()
                .parse::<f32>()
                .map_err(|_| ScannerError::BadReading { index })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ScannerFrame {
        scanner_id,
        readings,
    })
}
