//! Unit tests for Diagnostic reports

use core_types::{ContextId, Diagnostic, ErrorKind, RuntimeError, StackFrame};

#[test]
fn test_diagnostic_renders_trace() {
    let err = RuntimeError::new(ErrorKind::UndefinedMethod, "no method 'fly'")
        .at_offset(5)
        .with_trace(vec![
            StackFrame {
                function_name: Some("move".to_string()),
                offset: 5,
                line: Some(12),
            },
            StackFrame {
                function_name: None,
                offset: 20,
                line: None,
            },
        ]);
    let diag = Diagnostic::from_error(ContextId(0), &err);
    assert_eq!(diag.trace, vec!["move @5 (line 12)", "<script> @20"]);
    assert_eq!(
        diag.to_string(),
        "[ctx#0] UndefinedMethod: no method 'fly' at offset 5"
    );
}
