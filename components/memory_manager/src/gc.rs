//! Stop-the-world mark-and-sweep collection over the handle arena.
//!
//! Marking walks a gray worklist of handles seeded from the caller's roots
//! and every permanent object; a slot is scanned at most once per cycle, so
//! cyclic graphs terminate. Sweeping frees every unmarked, non-permanent
//! slot and clears the marks of survivors.

use core_types::{ObjRef, Value};

use crate::heap::Heap;
use crate::stats::CollectionReport;

impl Heap {
    /// Run a full collection cycle.
    ///
    /// `roots` must cover every handle the caller can still reach: operand
    /// stacks, globals, registries and pinned values. Must only be called at
    /// a safe point.
    pub fn collect(&mut self, roots: impl IntoIterator<Item = Value>) -> CollectionReport {
        self.mark(roots);
        let (reclaimed_bytes, reclaimed_objects) = self.sweep();

        self.collection_count += 1;
        self.last_reclaimed_bytes = reclaimed_bytes;
        self.last_reclaimed_objects = reclaimed_objects;
        self.next_threshold = self.config.next_threshold(self.live_bytes);

        tracing::debug!(
            cycle = self.collection_count,
            reclaimed_bytes,
            reclaimed_objects,
            live_bytes = self.live_bytes,
            next_threshold = self.next_threshold,
            "collection finished"
        );

        CollectionReport {
            reclaimed_bytes,
            reclaimed_objects,
            live_bytes: self.live_bytes,
            live_objects: self.live_objects,
            next_threshold: self.next_threshold,
        }
    }

    /// True if `handle` was marked by an in-progress cycle
    pub fn is_marked(&self, handle: ObjRef) -> bool {
        self.slots
            .get(handle.index as usize)
            .map(|slot| slot.generation == handle.generation && slot.marked)
            .unwrap_or(false)
    }

    fn mark(&mut self, roots: impl IntoIterator<Item = Value>) {
        let mut gray = std::mem::take(&mut self.gray);
        gray.clear();

        gray.extend(roots.into_iter().filter_map(|v| v.as_object()));
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.permanent && slot.object.is_some() {
                gray.push(ObjRef::new(index as u32, slot.generation));
            }
        }

        while let Some(handle) = gray.pop() {
            let Some(slot) = self.slots.get_mut(handle.index as usize) else {
                continue;
            };
            // Stale roots and already-visited slots are skipped.
            if slot.generation != handle.generation || slot.marked {
                continue;
            }
            if let Some(object) = &slot.object {
                slot.marked = true;
                object.trace(&mut gray);
            }
        }

        self.gray = gray;
    }

    fn sweep(&mut self) -> (usize, usize) {
        let mut reclaimed_bytes = 0;
        let mut reclaimed_objects = 0;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.is_none() {
                continue;
            }
            if slot.marked || slot.permanent {
                slot.marked = false;
                continue;
            }
            slot.object = None;
            slot.generation = slot.generation.wrapping_add(1);
            reclaimed_bytes += slot.size;
            reclaimed_objects += 1;
            slot.size = 0;
            self.free_list.push(index as u32);
        }

        self.live_bytes -= reclaimed_bytes;
        self.live_objects -= reclaimed_objects;

        let slots = &self.slots;
        self.interner.retain(|handle| {
            slots
                .get(handle.index as usize)
                .map(|slot| slot.generation == handle.generation && slot.object.is_some())
                .unwrap_or(false)
        });

        (reclaimed_bytes, reclaimed_objects)
    }
}
