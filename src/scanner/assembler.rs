//! Combines per-scanner frames into one four-channel scan.

use log::debug;

use super::SCANNER_COUNT;

/// Latest readings per scanner for the current cycle.
///
/// A cycle completes once every scanner has reported at least once; a
/// scanner that reports twice within a cycle overwrites its earlier frame.
#[derive(Debug, Default)]
pub struct ScanAssembler {
    latest: [Option<Vec<f32>>; SCANNER_COUNT],
    cycles: u64,
}

impl ScanAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `readings` for `scanner` (0-based).
    ///
    /// Returns the bundled channels, in scanner order, when this frame
    /// completes the cycle.  Out-of-range scanner indices are ignored.
    pub fn accept(&mut self, scanner: usize, readings: Vec<f32>) -> Option<Vec<Vec<f32>>> {
        let slot = self.latest.get_mut(scanner)?;
        *slot = Some(readings);

        if self.latest.iter().any(Option::is_none) {
            return None;
        }

        self.cycles += 1;
        debug!("Scan cycle {} complete", self.cycles);
        Some(
            self.latest
                .iter_mut()
                .map(|slot| slot.take().unwrap_or_default())
                .collect(),
        )
    }

    /// Scanners that have reported in the current cycle.
    pub fn pending(&self) -> usize {
        self.latest.iter().filter(|s| s.is_some()).count()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}
