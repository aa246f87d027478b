//! Log-based event and telemetry sink.
//!
//! Implements [`EventSink`] and [`TelemetrySink`] by writing one structured
//! line per event to the `log` facade.  A pub/sub publisher would implement
//! the same traits.

use log::{debug, info, warn};

use crate::app::events::{AppEvent, ThermalSample};
use crate::app::ports::{EventSink, TelemetrySink};
use crate::scanner::SCANNER_COUNT;

/// Adapter that logs every [`AppEvent`] and a summary of every sample.
#[derive(Debug, Default)]
pub struct LogEventSink {
    samples: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples published since construction.
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::StateChanged { from, to } => {
                info!(
                    "STATE | {:?} -> {:?} | summaryState={}",
                    from,
                    to,
                    to.summary_state()
                );
            }
            AppEvent::FaultDetected { code, report } => {
                warn!("FAULT | code={} | {}", code, report);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
        }
    }
}

impl TelemetrySink for LogEventSink {
    fn publish(&mut self, sample: &ThermalSample) {
        self.samples += 1;
        let mut means = [0.0f32; SCANNER_COUNT];
        for (i, mean) in means.iter_mut().enumerate() {
            *mean = sample.channel_mean(i).unwrap_or(f32::NAN);
        }
        debug!(
            "TELEM | t={:.3} | mean={:.1}/{:.1}/{:.1}/{:.1}\u{00b0}C | max={:.1}\u{00b0}C",
            sample.timestamp,
            means[0],
            means[1],
            means[2],
            means[3],
            sample.max_reading(),
        );
    }
}
