//! Sharing one runtime between host threads.
//!
//! The runtime is single-threaded internally; hosts that drive contexts
//! from several threads hold the runtime lock for the length of each call.
//! Bytecode never runs concurrently.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::Runtime;

/// A runtime guarded by a process-level lock.
pub type SharedRuntime = Arc<Mutex<Runtime>>;

impl Runtime {
    /// Wrap the runtime for use from several threads.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    /// use interpreter::Runtime;
    ///
    /// let shared = Runtime::new().into_shared();
    /// let worker = {
    ///     let shared = shared.clone();
    ///     std::thread::spawn(move || {
    ///         let mut rt = shared.lock();
    ///         rt.set_global("seen", Value::Bool(true)).unwrap();
    ///     })
    /// };
    /// worker.join().unwrap();
    /// assert_eq!(shared.lock().global("seen"), Some(Value::Bool(true)));
    /// ```
    pub fn into_shared(self) -> SharedRuntime {
        Arc::new(Mutex::new(self))
    }
}
