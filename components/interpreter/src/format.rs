//! Human-readable rendering of runtime values.

use std::fmt::Write;

use core_types::{ObjRef, Value};
use memory_manager::HeapObject;

use crate::Runtime;

const MAX_DEPTH: usize = 8;
const MAX_NODES: usize = 4096;

/// Walk state: containers on the current path and the remaining node budget.
struct Render {
    out: String,
    path: Vec<ObjRef>,
    budget: usize,
}

impl Runtime {
    /// Render `value` for printing.
    ///
    /// Strings render raw at the top level and quoted inside containers.
    /// A container that contains itself renders as `[...]` or `{...}` at the
    /// repeat; nesting deeper than a fixed limit, or output past a fixed node
    /// count, renders as `...`.
    pub fn display(&self, value: Value) -> String {
        let mut render = Render {
            out: String::new(),
            path: Vec::new(),
            budget: MAX_NODES,
        };
        self.write_value(&mut render, value, false);
        render.out
    }

    fn write_value(&self, r: &mut Render, value: Value, quoted: bool) {
        if r.budget == 0 {
            r.out.push_str("...");
            return;
        }
        r.budget -= 1;

        let handle = match value {
            Value::Object(h) => h,
            other => {
                let _ = write!(r.out, "{}", other);
                return;
            }
        };
        if r.path.len() > MAX_DEPTH {
            r.out.push_str("...");
            return;
        }

        let Ok(object) = self.heap.get(handle) else {
            r.out.push_str("<stale>");
            return;
        };
        match object {
            HeapObject::String(s) if quoted => {
                let _ = write!(r.out, "{:?}", &*s.text);
            }
            HeapObject::String(s) => r.out.push_str(&s.text),
            HeapObject::Array(_) if r.path.contains(&handle) => r.out.push_str("[...]"),
            HeapObject::Map(_) if r.path.contains(&handle) => r.out.push_str("{...}"),
            HeapObject::Array(items) => {
                r.path.push(handle);
                r.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        r.out.push_str(", ");
                    }
                    self.write_value(r, *item, true);
                    if r.budget == 0 {
                        break;
                    }
                }
                r.out.push(']');
                r.path.pop();
            }
            HeapObject::Map(map) => {
                r.path.push(handle);
                r.out.push('{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        r.out.push_str(", ");
                    }
                    self.write_value(r, key.0, true);
                    r.out.push_str(": ");
                    self.write_value(r, *item, true);
                    if r.budget == 0 {
                        break;
                    }
                }
                r.out.push('}');
                r.path.pop();
            }
            HeapObject::Instance(i) => {
                let _ = write!(r.out, "<{} instance>", self.class_label(i.class));
            }
            HeapObject::Class(_) => {
                let _ = write!(r.out, "<class {}>", self.class_label(handle));
            }
            HeapObject::Function(f) => {
                let _ = write!(r.out, "<fn {}>", f.name());
            }
            HeapObject::Native(n) => {
                let name = self.heap.string(n.name).unwrap_or("?");
                let _ = write!(r.out, "<native {}>", name);
            }
            HeapObject::BoundMethod(_) => r.out.push_str("<bound fn>"),
        }
    }
}
