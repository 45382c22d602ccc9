//! `$$StringImpl`: methods on string values

use core_types::{ObjRef, RuntimeResult, Value};
use interpreter::{NativeCall, ParamType, Runtime};
use memory_manager::HeapObject;

fn this(call: &NativeCall<'_>) -> RuntimeResult<String> {
    Ok(call.heap().string(call.receiver_object()?)?.to_string())
}

/// Characters `start..end` of `text`, clamped to its length
pub fn substring(text: &str, start: i64, end: i64) -> String {
    let len = text.chars().count() as i64;
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    if start >= end {
        return String::new();
    }
    text.chars().skip(start).take(end - start).collect()
}

pub(crate) fn install(rt: &mut Runtime, class: ObjRef) -> RuntimeResult<()> {
    rt.register_native(class, "len", 0u8, |call| {
        Ok(Value::Int(this(call)?.chars().count() as i64))
    })?;

    rt.register_native(class, "upper", 0u8, |call| {
        let text = this(call)?.to_uppercase();
        call.intern(&text)
    })?;

    rt.register_native(class, "lower", 0u8, |call| {
        let text = this(call)?.to_lowercase();
        call.intern(&text)
    })?;

    rt.register_native(class, "contains", [ParamType::String], |call| {
        let found = this(call)?.contains(call.str(0)?);
        Ok(Value::Bool(found))
    })?;

    rt.register_native(class, "substring", [ParamType::Int, ParamType::Int], |call| {
        let text = substring(&this(call)?, call.int(0)?, call.int(1)?);
        call.intern(&text)
    })?;

    rt.register_native(class, "split", [ParamType::String], |call| {
        let text = this(call)?;
        let sep = call.str(0)?.to_string();
        let mut parts = Vec::new();
        for part in text.split(sep.as_str()) {
            parts.push(call.intern(part)?);
        }
        call.alloc(HeapObject::Array(parts))
    })?;
    Ok(())
}
