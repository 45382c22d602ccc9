//! Runtime configuration.

use memory_manager::GcConfig;
use serde::{Deserialize, Serialize};

/// What `define_class` does when the name is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassRedefinition {
    /// Fail with `DuplicateClass`
    #[default]
    Error,
    /// Register the new class under the name; existing instances keep the old one
    Replace,
}

/// Limits and policies for a [`Runtime`](crate::Runtime).
///
/// # Examples
///
/// ```
/// use interpreter::{ClassRedefinition, RuntimeConfig};
///
/// let config = RuntimeConfig::default()
///     .with_max_call_depth(64)
///     .with_class_redefinition(ClassRedefinition::Replace);
///
/// assert_eq!(config.max_call_depth, 64);
/// assert_eq!(config.max_stack_slots, 16 * 1024);
/// assert_eq!(config.max_native_depth, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Collector settings
    pub gc: GcConfig,
    /// Maximum number of active script frames per context
    pub max_call_depth: usize,
    /// Maximum operand stack height per context
    pub max_stack_slots: usize,
    /// Maximum nesting of host routines per context, counting natives that
    /// call back into script
    pub max_native_depth: usize,
    /// Duplicate class name policy
    pub class_redefinition: ClassRedefinition,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            gc: GcConfig::default(),
            max_call_depth: 256,
            max_stack_slots: 16 * 1024,
            max_native_depth: 32,
            class_redefinition: ClassRedefinition::Error,
        }
    }
}

impl RuntimeConfig {
    /// Replace the collector settings
    pub fn with_gc(mut self, gc: GcConfig) -> Self {
        self.gc = gc;
        self
    }

    /// Set the frame depth limit
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the operand stack limit
    pub fn with_max_stack_slots(mut self, slots: usize) -> Self {
        self.max_stack_slots = slots;
        self
    }

    /// Set the host routine nesting limit
    pub fn with_max_native_depth(mut self, depth: usize) -> Self {
        self.max_native_depth = depth;
        self
    }

    /// Set the duplicate class policy
    pub fn with_class_redefinition(mut self, policy: ClassRedefinition) -> Self {
        self.class_redefinition = policy;
        self
    }
}
