//! Simulated thermal model.
//!
//! Stands in for the instrument's thermal business model when running the
//! controller on a workstation.  It keeps the latest scan, counts periodic
//! ticks, knows which settings labels exist, and raises a fault on the
//! rising edge of an over-temperature reading.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use crate::app::events::ThermalSample;
use crate::app::ports::{ModelError, ModelFault, ThermalModel};
use crate::config::SystemConfig;

/// Fault code raised when a reading exceeds the configured maximum.
pub const FAULT_OVER_TEMPERATURE: i32 = 1;

/// Set once the model has been asked to shut down.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct SimulatedModel {
    settings_labels: Vec<String>,
    active_settings: Option<String>,
    max_temperature_c: f32,
    ticks: u64,
    samples: u64,
    last_sample: Option<ThermalSample>,
    over_temperature: bool,
    pending_fault: Option<ModelFault>,
    shutdown: ShutdownSignal,
}

impl SimulatedModel {
    pub fn new(config: &SystemConfig, shutdown: ShutdownSignal) -> Self {
        Self {
            settings_labels: config.settings_labels.clone(),
            active_settings: None,
            max_temperature_c: config.max_temperature_c,
            ticks: 0,
            samples: 0,
            last_sample: None,
            over_temperature: false,
            pending_fault: None,
            shutdown,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn last_sample(&self) -> Option<&ThermalSample> {
        self.last_sample.as_ref()
    }

    pub fn active_settings(&self) -> Option<&str> {
        self.active_settings.as_deref()
    }
}

impl ThermalModel for SimulatedModel {
    fn periodic_tick(&mut self) {
        self.ticks += 1;
        match &self.last_sample {
            Some(s) => debug!("Model tick {}: hottest reading {:.1}", self.ticks, s.max_reading()),
            None => debug!("Model tick {}: no scan yet", self.ticks),
        }
    }

    fn trigger_shutdown(&mut self) {
        info!("Model shutdown requested");
        self.shutdown.request();
    }

    fn ingest_thermal_sample(&mut self, sample: &ThermalSample) {
        self.samples += 1;
        let hottest = sample.max_reading();
        let over = hottest > self.max_temperature_c;
        if over && !self.over_temperature {
            self.pending_fault = Some(ModelFault {
                code: FAULT_OVER_TEMPERATURE,
                report: format!(
                    "reading {:.1} C exceeds limit {:.1} C",
                    hottest, self.max_temperature_c
                ),
            });
        }
        self.over_temperature = over;
        self.last_sample = Some(sample.clone());
    }

    fn load_settings(&mut self, label: &str) -> Result<(), ModelError> {
        if !self.settings_labels.iter().any(|l| l == label) {
            return Err(ModelError::UnknownSettings(label.to_string()));
        }
        self.active_settings = Some(label.to_string());
        Ok(())
    }

    fn take_fault(&mut self) -> Option<ModelFault> {
        self.pending_fault.take()
    }
}
