//! Unit tests for RuntimeError and ErrorKind

use core_types::{ErrorKind, RuntimeError, StackFrame};

#[test]
fn test_runtime_error_display() {
    let err = RuntimeError::new(ErrorKind::ArgumentCountMismatch, "expected 2 arguments, got 1");
    assert_eq!(
        err.to_string(),
        "ArgumentCountMismatch: expected 2 arguments, got 1"
    );
}

#[test]
fn test_trace_is_not_overwritten() {
    let inner = vec![StackFrame {
        function_name: Some("inner".to_string()),
        offset: 2,
        line: None,
    }];
    let outer = vec![StackFrame {
        function_name: Some("outer".to_string()),
        offset: 9,
        line: None,
    }];
    let err = RuntimeError::new(ErrorKind::StackOverflow, "too deep")
        .with_trace(inner.clone())
        .with_trace(outer);
    assert_eq!(err.trace, inner);
}

#[test]
fn test_error_is_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&RuntimeError::new(ErrorKind::OutOfMemory, "heap limit"));
}
