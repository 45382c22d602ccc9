//! `$$FunctionImpl`: methods available on every callable value

use core_types::{ObjRef, RuntimeResult, Value};
use interpreter::{NativeSignature, ParamType, Runtime};
use memory_manager::HeapObject;

pub(crate) fn install(rt: &mut Runtime, class: ObjRef) -> RuntimeResult<()> {
    // f.bind(receiver): calling the result calls f with `receiver` in slot 0.
    rt.register_native(class, "bind", [ParamType::Any], |call| {
        let (method, receiver) = (call.receiver(), call.arg(0));
        call.bind(method, receiver)
    })?;

    rt.register_native(
        class,
        "call",
        NativeSignature::variadic(Vec::<ParamType>::new(), ParamType::Any),
        |call| {
            let args = call.args().to_vec();
            call.invoke(call.receiver(), &args)
        },
    )?;

    rt.register_native(class, "arity", 0u8, |call| {
        let arity = match call.heap().get(call.receiver_object()?)? {
            HeapObject::Function(f) => Value::Int(i64::from(f.arity())),
            _ => Value::Null,
        };
        Ok(arity)
    })?;
    Ok(())
}
