//! `$$MapImpl`: methods on map values

use core_types::{ObjRef, RuntimeResult, Value};
use interpreter::{ParamType, Runtime};
use memory_manager::{HeapObject, MapKey};

pub(crate) fn install(rt: &mut Runtime, class: ObjRef) -> RuntimeResult<()> {
    rt.register_native(class, "len", 0u8, |call| {
        let this = call.receiver_object()?;
        Ok(Value::Int(call.heap().map(this)?.len() as i64))
    })?;

    rt.register_native(class, "has", [ParamType::Any], |call| {
        let this = call.receiver_object()?;
        let key = MapKey(call.arg(0));
        Ok(Value::Bool(call.heap().map(this)?.contains_key(&key)))
    })?;

    rt.register_native(class, "get", [ParamType::Any, ParamType::Any], |call| {
        let this = call.receiver_object()?;
        let key = MapKey(call.arg(0));
        Ok(call.heap().map(this)?.get(&key).copied().unwrap_or(call.arg(1)))
    })?;

    rt.register_native(class, "set", [ParamType::Any, ParamType::Any], |call| {
        let (this, key, value) = (call.receiver_object()?, call.arg(0), call.arg(1));
        call.update(this, |obj| {
            if let HeapObject::Map(map) = obj {
                map.insert(MapKey(key), value);
            }
        })?;
        Ok(Value::Null)
    })?;

    rt.register_native(class, "remove", [ParamType::Any], |call| {
        let (this, key) = (call.receiver_object()?, call.arg(0));
        let removed = call.update(this, |obj| match obj {
            HeapObject::Map(map) => map.shift_remove(&MapKey(key)),
            _ => None,
        })?;
        Ok(removed.unwrap_or(Value::Null))
    })?;

    rt.register_native(class, "keys", 0u8, |call| {
        let this = call.receiver_object()?;
        let keys = call.heap().map(this)?.keys().map(|k| k.0).collect();
        call.alloc(HeapObject::Array(keys))
    })?;
    Ok(())
}
