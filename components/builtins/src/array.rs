//! `$$ArrayImpl`: methods on array values

use core_types::{ErrorKind, ObjRef, RuntimeError, RuntimeResult, Value};
use interpreter::{NativeCall, ParamType, Runtime};
use memory_manager::HeapObject;

fn items(call: &NativeCall<'_>) -> RuntimeResult<Vec<Value>> {
    Ok(call.heap().array(call.receiver_object()?)?.to_vec())
}

/// Snapshot of the receiver's items, pinned so callbacks may mutate the array
fn pinned_items(call: &mut NativeCall<'_>) -> RuntimeResult<Vec<Value>> {
    let snapshot = items(call)?;
    for item in &snapshot {
        call.pin(*item);
    }
    Ok(snapshot)
}

fn len_value(len: usize) -> Value {
    Value::Int(len as i64)
}

pub(crate) fn install(rt: &mut Runtime, class: ObjRef) -> RuntimeResult<()> {
    rt.register_native(class, "len", 0u8, |call| {
        let this = call.receiver_object()?;
        Ok(len_value(call.heap().array(this)?.len()))
    })?;

    rt.register_native(class, "push", [ParamType::Any], |call| {
        let (this, value) = (call.receiver_object()?, call.arg(0));
        let len = call.update(this, |obj| match obj {
            HeapObject::Array(items) => {
                items.push(value);
                items.len()
            }
            _ => 0,
        })?;
        Ok(len_value(len))
    })?;

    rt.register_native(class, "pop", 0u8, |call| {
        let this = call.receiver_object()?;
        let popped = call.update(this, |obj| match obj {
            HeapObject::Array(items) => items.pop(),
            _ => None,
        })?;
        Ok(popped.unwrap_or(Value::Null))
    })?;

    rt.register_native(class, "contains", [ParamType::Any], |call| {
        let needle = call.arg(0);
        let this = call.receiver_object()?;
        let heap = call.heap();
        let found = heap.array(this)?.iter().any(|item| {
            item.same(&needle)
                || matches!((heap.as_str(*item), heap.as_str(needle)), (Some(a), Some(b)) if a == b)
        });
        Ok(Value::Bool(found))
    })?;

    rt.register_native(class, "join", [ParamType::String], |call| {
        let sep = call.str(0)?.to_string();
        let text = items(call)?
            .iter()
            .map(|v| call.display(*v))
            .collect::<Vec<_>>()
            .join(&sep);
        call.intern(&text)
    })?;

    rt.register_native(class, "map", [ParamType::Callable], |call| {
        let f = call.arg(0);
        let mut mapped = Vec::new();
        for item in pinned_items(call)? {
            let value = call.invoke(f, &[item])?;
            // Results are unreachable until the new array exists.
            call.pin(value);
            mapped.push(value);
        }
        call.alloc(HeapObject::Array(mapped))
    })?;

    rt.register_native(class, "filter", [ParamType::Callable], |call| {
        let f = call.arg(0);
        let mut kept = Vec::new();
        for item in pinned_items(call)? {
            if call.invoke(f, &[item])?.is_truthy() {
                kept.push(item);
            }
        }
        call.alloc(HeapObject::Array(kept))
    })?;

    rt.register_native(class, "get", [ParamType::Int], |call| {
        let i = call.int(0)?;
        let items = items(call)?;
        usize::try_from(i)
            .ok()
            .and_then(|i| items.get(i).copied())
            .ok_or_else(|| {
                RuntimeError::new(
                    ErrorKind::IndexOutOfRange,
                    format!("index {} out of range for length {}", i, items.len()),
                )
            })
    })?;
    Ok(())
}
