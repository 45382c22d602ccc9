//! Collector tuning.

use serde::{Deserialize, Serialize};

/// One mebibyte, the default initial threshold and floor.
pub const MIB: usize = 1024 * 1024;

/// Garbage collector configuration.
///
/// After each cycle the trigger threshold becomes
/// `max(live_bytes * growth_factor, min_threshold)`.
///
/// # Examples
///
/// ```
/// use memory_manager::GcConfig;
///
/// let config = GcConfig::default()
///     .with_initial_threshold(64 * 1024)
///     .with_max_heap_bytes(Some(8 * 1024 * 1024));
///
/// assert_eq!(config.initial_threshold, 64 * 1024);
/// assert!(!config.stress);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcConfig {
    /// Live bytes that trigger the first collection
    pub initial_threshold: usize,
    /// Multiplier applied to surviving bytes to get the next threshold
    pub growth_factor: f64,
    /// Lower bound for the adaptive threshold
    pub min_threshold: usize,
    /// Hard cap on live bytes; allocations past it fail with `OutOfMemory`
    pub max_heap_bytes: Option<usize>,
    /// Collect at every safe point
    pub stress: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            initial_threshold: MIB,
            growth_factor: 2.0,
            min_threshold: MIB,
            max_heap_bytes: None,
            stress: false,
        }
    }
}

impl GcConfig {
    /// Set the first collection threshold
    pub fn with_initial_threshold(mut self, bytes: usize) -> Self {
        self.initial_threshold = bytes;
        self
    }

    /// Set the threshold growth factor (values below 1.0 are treated as 1.0)
    pub fn with_growth_factor(mut self, factor: f64) -> Self {
        self.growth_factor = factor;
        self
    }

    /// Set the adaptive threshold floor
    pub fn with_min_threshold(mut self, bytes: usize) -> Self {
        self.min_threshold = bytes;
        self
    }

    /// Set or clear the hard heap cap
    pub fn with_max_heap_bytes(mut self, bytes: Option<usize>) -> Self {
        self.max_heap_bytes = bytes;
        self
    }

    /// Enable or disable stress collection
    pub fn with_stress(mut self, stress: bool) -> Self {
        self.stress = stress;
        self
    }

    /// Threshold to use after a cycle that left `live_bytes` alive
    pub fn next_threshold(&self, live_bytes: usize) -> usize {
        let factor = if self.growth_factor.is_finite() {
            self.growth_factor.max(1.0)
        } else {
            1.0
        };
        let grown = (live_bytes as f64 * factor) as usize;
        grown.max(self.min_threshold).max(1)
    }
}
