//! Outbound application events and telemetry.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) and
//! [`TelemetrySink`](super::ports::TelemetrySink) ports.  Adapters on the
//! other side decide what to do with them.

use heapless::Vec as HVec;
use serde::{Deserialize, Serialize};

use crate::fsm::StateId;
use crate::scanner::{SCANNER_CHANNEL_LEN, SCANNER_COUNT};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started (carries initial state).
    Started(StateId),

    /// Summary state changed.  Exactly one per transition.
    StateChanged { from: StateId, to: StateId },

    /// The model latched a fault; the controller is entering Fault.
    FaultDetected { code: i32, report: String },
}

/// One scanner channel: exactly [`SCANNER_CHANNEL_LEN`] readings.
pub type ChannelReadings = HVec<f32, SCANNER_CHANNEL_LEN>;

/// A timestamped four-channel scan, published once per dispatched
/// `scannerData` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalSample {
    /// Seconds since the Unix epoch, assigned at publish time.
    pub timestamp: f64,
    pub scanners: [ChannelReadings; SCANNER_COUNT],
}

impl ThermalSample {
    /// Build from validated channels.  Returns `None` unless there are
    /// exactly four channels of exactly 95 readings.
    pub fn from_channels(timestamp: f64, channels: &[Vec<f32>]) -> Option<Self> {
        if channels.len() != SCANNER_COUNT {
            return None;
        }
        let mut scanners: [ChannelReadings; SCANNER_COUNT] = Default::default();
        for (dst, src) in scanners.iter_mut().zip(channels) {
            if src.len() != SCANNER_CHANNEL_LEN {
                return None;
            }
            *dst = HVec::from_slice(src).ok()?;
        }
        Some(Self {
            timestamp,
            scanners,
        })
    }

    /// Hottest reading across all channels.
    pub fn max_reading(&self) -> f32 {
        self.scanners
            .iter()
            .flat_map(|c| c.iter().copied())
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Mean of one channel.
    pub fn channel_mean(&self, channel: usize) -> Option<f32> {
        let c = self.scanners.get(channel)?;
        if c.is_empty() {
            return None;
        }
        Some(c.iter().sum::<f32>() / c.len() as f32)
    }
}
