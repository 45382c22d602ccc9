//! Memory telemetry.

use serde::Serialize;

/// Read-only heap counters for host overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryStats {
    /// Bytes currently accounted to live objects
    pub live_bytes: usize,
    /// Number of live objects
    pub live_objects: usize,
    /// Bytes reclaimed by the most recent collection
    pub last_reclaimed_bytes: usize,
    /// Objects reclaimed by the most recent collection
    pub last_reclaimed_objects: usize,
    /// Collections run since the heap was created
    pub collection_count: u64,
    /// Live bytes that will trigger the next collection
    pub next_threshold: usize,
    /// Strings currently interned
    pub interned_strings: usize,
}

/// Outcome of one collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CollectionReport {
    /// Bytes released by the sweep
    pub reclaimed_bytes: usize,
    /// Objects released by the sweep
    pub reclaimed_objects: usize,
    /// Bytes still live afterwards
    pub live_bytes: usize,
    /// Objects still live afterwards
    pub live_objects: usize,
    /// Threshold for the next cycle
    pub next_threshold: usize,
}
