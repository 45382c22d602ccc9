//! Contract tests for interpreter API
//!
//! These tests pin down the public surface hosts rely on.

use core_types::{ContextId, ErrorKind, Value};
use interpreter::{
    ClassRedefinition, ContextState, NativeSignature, ParamType, Runtime, RuntimeConfig,
    SharedRuntime,
};

/// Runtime::new creates exactly one context, the main one
#[test]
fn test_runtime_new_contract() {
    let rt = Runtime::new();
    let main = rt.main_context();
    assert_eq!(main, ContextId(0));
    assert_eq!(rt.context_state(main), Some(ContextState::Ready));
    assert_eq!(rt.class_count(), 0);
}

/// Created contexts get fresh identifiers
#[test]
fn test_create_context_contract() {
    let mut rt = Runtime::new();
    let a = rt.create_context();
    let b = rt.create_context();
    assert_ne!(a, b);
    assert_ne!(a, rt.main_context());
}

/// Only Ready and Completed contexts accept work
#[test]
fn test_context_state_contract() {
    assert!(ContextState::Ready.accepts_work());
    assert!(ContextState::Completed.accepts_work());
    assert!(!ContextState::Running.accepts_work());
    assert!(!ContextState::SuspendedAtNativeCall.accepts_work());
    assert!(!ContextState::Faulted.accepts_work());
}

/// Configuration defaults and serde shape
#[test]
fn test_runtime_config_contract() {
    let config = RuntimeConfig::default();
    assert_eq!(config.max_call_depth, 256);
    assert_eq!(config.class_redefinition, ClassRedefinition::Error);

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"class_redefinition\":\"error\""));

    let parsed: RuntimeConfig =
        serde_json::from_str(r#"{"max_call_depth": 8, "class_redefinition": "replace"}"#).unwrap();
    assert_eq!(parsed.max_call_depth, 8);
    assert_eq!(parsed.max_stack_slots, 16 * 1024);
    assert_eq!(parsed.class_redefinition, ClassRedefinition::Replace);
}

/// Registering on a non-class handle fails without side effects
#[test]
fn test_register_native_contract() {
    let mut rt = Runtime::new();
    rt.set_global("x", Value::Null).unwrap();
    let not_a_class = rt.heap().lookup_interned("x").unwrap();
    let err = rt
        .register_native(not_a_class, "f", 0u8, |_| Ok(Value::Null))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

/// Signatures report arity and variadic-ness
#[test]
fn test_native_signature_contract() {
    let sig = NativeSignature::new([ParamType::Int, ParamType::String]);
    assert_eq!(sig.arity(), 2);
    assert!(!sig.is_variadic());
    assert_eq!(ParamType::Callable.name(), "callable");
}

/// Calling a non-callable value is a type error, not a panic
#[test]
fn test_call_contract() {
    let mut rt = Runtime::new();
    let err = rt.call(Value::Int(1), &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

/// A shared runtime is an Arc around a lock
#[test]
fn test_shared_runtime_contract() {
    let shared: SharedRuntime = Runtime::new().into_shared();
    let clone = shared.clone();
    clone.lock().set_global("k", Value::Int(1)).unwrap();
    assert_eq!(shared.lock().global("k"), Some(Value::Int(1)));
}
