//! Contract tests for methods on string values

use super::{eval, int, invoke, runtime, string};
use core_types::Value;

#[test]
fn test_string_len_counts_chars() {
    let (mut rt, _) = runtime();
    let len = eval(&mut rt, |c| {
        string(c, "héllo");
        invoke(c, "len", 0);
    })
    .unwrap();
    assert_eq!(len, Value::Int(5));
}

#[test]
fn test_string_upper_is_interned() {
    let (mut rt, _) = runtime();
    let upper = eval(&mut rt, |c| {
        string(c, "boss");
        invoke(c, "upper", 0);
    })
    .unwrap();
    assert_eq!(rt.display(upper), "BOSS");
    assert_eq!(rt.heap().lookup_interned("BOSS"), upper.as_object());
}

#[test]
fn test_string_split() {
    let (mut rt, _) = runtime();
    let parts = eval(&mut rt, |c| {
        string(c, "a,b,c");
        string(c, ",");
        invoke(c, "split", 1);
    })
    .unwrap();
    assert_eq!(rt.display(parts), "[\"a\", \"b\", \"c\"]");
}

#[test]
fn test_string_substring_and_contains() {
    let (mut rt, _) = runtime();
    let sub = eval(&mut rt, |c| {
        string(c, "dragon");
        int(c, 1);
        int(c, 4);
        invoke(c, "substring", 2);
    })
    .unwrap();
    assert_eq!(rt.display(sub), "rag");

    let found = eval(&mut rt, |c| {
        string(c, "dragon");
        string(c, "ago");
        invoke(c, "contains", 1);
    })
    .unwrap();
    assert_eq!(found, Value::Bool(true));
}
