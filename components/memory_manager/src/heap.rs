//! Handle arena owning every garbage-collected object.
//!
//! Objects live in a vector of slots addressed by [`ObjRef`]. A slot's
//! generation is bumped when the collector frees it, so a handle kept past
//! its object's lifetime is detected as stale instead of aliasing whatever
//! reuses the slot.

use core_types::{ErrorKind, ObjRef, RuntimeError, RuntimeResult, Value};

use crate::config::GcConfig;
use crate::interner::Interner;
use crate::object::{
    ClassObject, FunctionObject, HeapObject, InstanceObject, MapTable, StringObject,
};
use crate::stats::MemoryStats;

#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) object: Option<HeapObject>,
    pub(crate) generation: u32,
    pub(crate) marked: bool,
    pub(crate) permanent: bool,
    pub(crate) size: usize,
}

/// The managed heap.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use memory_manager::{Heap, HeapObject};
///
/// let mut heap = Heap::new();
/// let hello = heap.intern("hello").unwrap();
/// let list = heap.allocate(HeapObject::Array(vec![Value::Object(hello)])).unwrap();
///
/// assert_eq!(heap.intern("hello").unwrap(), hello);
/// assert_eq!(heap.array(list).unwrap().len(), 1);
///
/// // Nothing roots the array, so both objects are reclaimed.
/// let report = heap.collect(std::iter::empty());
/// assert_eq!(report.reclaimed_objects, 2);
/// assert!(!heap.contains(hello));
/// ```
#[derive(Debug)]
pub struct Heap {
    pub(crate) slots: Vec<Slot>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) interner: Interner,
    pub(crate) config: GcConfig,
    pub(crate) live_bytes: usize,
    pub(crate) live_objects: usize,
    pub(crate) next_threshold: usize,
    pub(crate) collection_count: u64,
    pub(crate) last_reclaimed_bytes: usize,
    pub(crate) last_reclaimed_objects: usize,
    /// Worklist reused across mark phases
    pub(crate) gray: Vec<ObjRef>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

fn stale(handle: ObjRef) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::StaleReference,
        format!("{:?} refers to a reclaimed object", handle),
    )
}

fn wrong_kind(expected: &str, found: &HeapObject) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::TypeMismatch,
        format!("expected {}, found {}", expected, found.kind_name()),
    )
}

impl Heap {
    /// Create a heap with default collector settings
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    /// Create a heap with the given collector settings
    pub fn with_config(config: GcConfig) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            interner: Interner::new(),
            next_threshold: config.initial_threshold.max(1),
            config,
            live_bytes: 0,
            live_objects: 0,
            collection_count: 0,
            last_reclaimed_bytes: 0,
            last_reclaimed_objects: 0,
            gray: Vec::new(),
        }
    }

    /// Collector settings
    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    /// Allocate `object` and return its handle.
    ///
    /// The object's size counts toward the collection threshold. Fails with
    /// `OutOfMemory` if the configured cap would be exceeded or the arena
    /// cannot grow.
    pub fn allocate(&mut self, object: HeapObject) -> RuntimeResult<ObjRef> {
        let size = object.size_hint();
        self.check_limit(size)?;

        let handle = match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.object = Some(object);
                slot.marked = false;
                slot.permanent = false;
                slot.size = size;
                ObjRef::new(index, slot.generation)
            }
            None => {
                self.slots.try_reserve(1).map_err(|_| {
                    RuntimeError::new(ErrorKind::OutOfMemory, "heap arena cannot grow")
                })?;
                let index = u32::try_from(self.slots.len()).map_err(|_| {
                    RuntimeError::new(ErrorKind::OutOfMemory, "heap slot index space exhausted")
                })?;
                self.slots.push(Slot {
                    object: Some(object),
                    generation: 0,
                    marked: false,
                    permanent: false,
                    size,
                });
                ObjRef::new(index, 0)
            }
        };

        self.live_bytes += size;
        self.live_objects += 1;
        Ok(handle)
    }

    /// Allocate an object that the collector never reclaims
    pub fn allocate_permanent(&mut self, object: HeapObject) -> RuntimeResult<ObjRef> {
        let handle = self.allocate(object)?;
        self.set_permanent(handle, true)?;
        Ok(handle)
    }

    /// Intern `text`, returning the unique handle for its contents
    pub fn intern(&mut self, text: &str) -> RuntimeResult<ObjRef> {
        if let Some(handle) = self.interner.get(text) {
            return Ok(handle);
        }
        let hash = self.interner.hash(text);
        let handle = self.allocate(HeapObject::String(StringObject {
            text: text.into(),
            hash,
        }))?;
        self.interner.insert(text.into(), handle);
        Ok(handle)
    }

    /// Interned handle for `text` without allocating
    pub fn lookup_interned(&self, text: &str) -> Option<ObjRef> {
        self.interner.get(text)
    }

    fn check_limit(&self, extra: usize) -> RuntimeResult<()> {
        match self.config.max_heap_bytes {
            Some(max) if self.live_bytes.saturating_add(extra) > max => Err(RuntimeError::new(
                ErrorKind::OutOfMemory,
                format!(
                    "heap limit of {} bytes exceeded ({} live, {} requested)",
                    max, self.live_bytes, extra
                ),
            )),
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Checked access
    // -----------------------------------------------------------------------

    fn slot(&self, handle: ObjRef) -> RuntimeResult<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.object.is_some())
            .ok_or_else(|| stale(handle))
    }

    fn slot_mut(&mut self, handle: ObjRef) -> RuntimeResult<&mut Slot> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.object.is_some())
            .ok_or_else(|| stale(handle))
    }

    /// True if `handle` refers to a live object
    pub fn contains(&self, handle: ObjRef) -> bool {
        self.slot(handle).is_ok()
    }

    /// Borrow an object
    pub fn get(&self, handle: ObjRef) -> RuntimeResult<&HeapObject> {
        self.slot(handle)?.object.as_ref().ok_or_else(|| stale(handle))
    }

    /// Borrow an object mutably without re-accounting its size.
    ///
    /// Use [`Heap::update`] for mutations that can grow the object.
    pub fn get_mut(&mut self, handle: ObjRef) -> RuntimeResult<&mut HeapObject> {
        self.slot_mut(handle)?
            .object
            .as_mut()
            .ok_or_else(|| stale(handle))
    }

    /// Mutate an object and refresh its byte accounting
    pub fn update<R>(
        &mut self,
        handle: ObjRef,
        f: impl FnOnce(&mut HeapObject) -> R,
    ) -> RuntimeResult<R> {
        let slot = self.slot_mut(handle)?;
        let object = slot.object.as_mut().ok_or_else(|| stale(handle))?;
        let out = f(object);
        let new_size = object.size_hint();
        let old_size = std::mem::replace(&mut slot.size, new_size);
        self.live_bytes = self.live_bytes - old_size + new_size;
        Ok(out)
    }

    /// Mark or unmark an object as a permanent root
    pub fn set_permanent(&mut self, handle: ObjRef, permanent: bool) -> RuntimeResult<()> {
        self.slot_mut(handle)?.permanent = permanent;
        Ok(())
    }

    /// True if the object is never reclaimed
    pub fn is_permanent(&self, handle: ObjRef) -> bool {
        self.slot(handle).map(|s| s.permanent).unwrap_or(false)
    }

    // -----------------------------------------------------------------------
    // Typed access
    // -----------------------------------------------------------------------

    /// String contents
    pub fn string(&self, handle: ObjRef) -> RuntimeResult<&str> {
        match self.get(handle)? {
            HeapObject::String(s) => Ok(&s.text),
            other => Err(wrong_kind("string", other)),
        }
    }

    /// Precomputed hash of a string
    pub fn string_hash(&self, handle: ObjRef) -> RuntimeResult<u64> {
        match self.get(handle)? {
            HeapObject::String(s) => Ok(s.hash),
            other => Err(wrong_kind("string", other)),
        }
    }

    /// Function object
    pub fn function(&self, handle: ObjRef) -> RuntimeResult<&FunctionObject> {
        match self.get(handle)? {
            HeapObject::Function(f) => Ok(f),
            other => Err(wrong_kind("function", other)),
        }
    }

    /// Class object
    pub fn class(&self, handle: ObjRef) -> RuntimeResult<&ClassObject> {
        match self.get(handle)? {
            HeapObject::Class(c) => Ok(c),
            other => Err(wrong_kind("class", other)),
        }
    }

    /// Instance object
    pub fn instance(&self, handle: ObjRef) -> RuntimeResult<&InstanceObject> {
        match self.get(handle)? {
            HeapObject::Instance(i) => Ok(i),
            other => Err(wrong_kind("instance", other)),
        }
    }

    /// Array elements
    pub fn array(&self, handle: ObjRef) -> RuntimeResult<&[Value]> {
        match self.get(handle)? {
            HeapObject::Array(items) => Ok(items),
            other => Err(wrong_kind("array", other)),
        }
    }

    /// Map entries
    pub fn map(&self, handle: ObjRef) -> RuntimeResult<&MapTable> {
        match self.get(handle)? {
            HeapObject::Map(map) => Ok(map),
            other => Err(wrong_kind("map", other)),
        }
    }

    /// Contents of `value` if it is a string
    pub fn as_str(&self, value: Value) -> Option<&str> {
        value.as_object().and_then(|r| self.string(r).ok())
    }

    /// Type name of a value for error messages
    pub fn type_name(&self, value: Value) -> &'static str {
        match value {
            Value::Object(r) => self.get(r).map(HeapObject::kind_name).unwrap_or("stale"),
            other => other.type_name(),
        }
    }

    // -----------------------------------------------------------------------
    // Telemetry
    // -----------------------------------------------------------------------

    /// Bytes accounted to live objects
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Number of live objects
    pub fn live_objects(&self) -> usize {
        self.live_objects
    }

    /// Threshold that triggers the next collection
    pub fn next_threshold(&self) -> usize {
        self.next_threshold
    }

    /// True when a collection is due at the next safe point
    pub fn should_collect(&self) -> bool {
        self.config.stress || self.live_bytes >= self.next_threshold
    }

    /// Number of interned strings
    pub fn interned_count(&self) -> usize {
        self.interner.len()
    }

    /// Snapshot of the heap counters
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            live_bytes: self.live_bytes,
            live_objects: self.live_objects,
            last_reclaimed_bytes: self.last_reclaimed_bytes,
            last_reclaimed_objects: self.last_reclaimed_objects,
            collection_count: self.collection_count,
            next_threshold: self.next_threshold,
            interned_strings: self.interner.len(),
        }
    }

    /// Release every object, permanent ones included.
    ///
    /// Handles issued before the call are stale afterwards.
    pub fn release_all(&mut self) {
        let released = self.live_objects;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
            }
            slot.marked = false;
            slot.permanent = false;
            slot.size = 0;
        }
        self.interner.clear();
        self.live_bytes = 0;
        self.live_objects = 0;
        tracing::debug!(released, "heap released");
    }
}
