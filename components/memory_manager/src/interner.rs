//! String interning table.
//!
//! Maps string contents to the single heap handle holding them, so string
//! equality is handle equality. Entries are weak: the collector drops an
//! entry when its string is reclaimed, and re-interning the same text later
//! yields a fresh handle.

use ahash::{AHashMap, RandomState};
use core_types::ObjRef;
use std::hash::BuildHasher;

// Fixed seeds keep precomputed string hashes stable for the process.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Content → handle table.
#[derive(Debug)]
pub struct Interner {
    table: AHashMap<Box<str>, ObjRef>,
    hasher: RandomState,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            table: AHashMap::new(),
            hasher: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
        }
    }

    /// Handle for `text`, if it is currently interned
    pub fn get(&self, text: &str) -> Option<ObjRef> {
        self.table.get(text).copied()
    }

    /// Content hash stored alongside each string
    pub fn hash(&self, text: &str) -> u64 {
        BuildHasher::hash_one(&self.hasher, text)
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if nothing is interned
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub(crate) fn insert(&mut self, text: Box<str>, handle: ObjRef) {
        self.table.insert(text, handle);
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(ObjRef) -> bool) {
        self.table.retain(|_, handle| keep(*handle));
    }

    pub(crate) fn clear(&mut self) {
        self.table.clear();
    }
}
