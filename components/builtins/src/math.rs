//! Math class with static methods

use core_types::{ErrorKind, ObjRef, RuntimeError, RuntimeResult, Value};
use interpreter::{NativeSignature, ParamType, Runtime};

/// Math routines behind the `Math` class
pub struct MathObject;

impl MathObject {
    /// Math.abs(x); integers stay integers
    pub fn abs(x: Value) -> Value {
        match x {
            Value::Int(n) => Value::Int(n.wrapping_abs()),
            Value::Float(n) => Value::Float(n.abs()),
            other => other,
        }
    }

    /// Math.floor(x)
    pub fn floor(x: f64) -> f64 {
        x.floor()
    }

    /// Math.ceil(x)
    pub fn ceil(x: f64) -> f64 {
        x.ceil()
    }

    /// Math.round(x), halves away from zero
    pub fn round(x: f64) -> f64 {
        x.round()
    }

    /// Math.sqrt(x)
    pub fn sqrt(x: f64) -> f64 {
        x.sqrt()
    }

    /// Math.pow(base, exponent)
    pub fn pow(base: f64, exponent: f64) -> f64 {
        base.powf(exponent)
    }

    /// Math.sin(x)
    pub fn sin(x: f64) -> f64 {
        x.sin()
    }

    /// Math.cos(x)
    pub fn cos(x: f64) -> f64 {
        x.cos()
    }

    /// Math.atan2(y, x)
    pub fn atan2(y: f64, x: f64) -> f64 {
        y.atan2(x)
    }

    /// Math.clamp(x, lo, hi)
    pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
        x.max(lo).min(hi)
    }

    /// Math.min(...values) / Math.max(...values).
    ///
    /// Integer if every argument is an integer, float otherwise.
    pub fn extreme(values: &[Value], want_max: bool) -> Option<Value> {
        if values.iter().all(|v| matches!(v, Value::Int(_))) {
            let ints = values.iter().filter_map(Value::as_int);
            let best = if want_max { ints.max() } else { ints.min() };
            return best.map(Value::Int);
        }
        let floats = values.iter().filter_map(Value::as_number);
        let best = if want_max {
            floats.fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.max(x))))
        } else {
            floats.fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.min(x))))
        };
        best.map(Value::Float)
    }
}

type Unary = fn(f64) -> f64;

pub(crate) fn install(rt: &mut Runtime, class: ObjRef) -> RuntimeResult<()> {
    rt.set_static(class, "PI", Value::Float(std::f64::consts::PI))?;
    rt.set_static(class, "E", Value::Float(std::f64::consts::E))?;

    rt.register_native(class, "abs", [ParamType::Number], |call| {
        Ok(MathObject::abs(call.arg(0)))
    })?;

    let unary: [(&str, Unary); 6] = [
        ("floor", MathObject::floor),
        ("ceil", MathObject::ceil),
        ("round", MathObject::round),
        ("sqrt", MathObject::sqrt),
        ("sin", MathObject::sin),
        ("cos", MathObject::cos),
    ];
    for (name, f) in unary {
        rt.register_native(class, name, [ParamType::Number], move |call| {
            Ok(Value::Float(f(call.number(0)?)))
        })?;
    }

    rt.register_native(class, "pow", [ParamType::Number, ParamType::Number], |call| {
        Ok(Value::Float(MathObject::pow(call.number(0)?, call.number(1)?)))
    })?;
    rt.register_native(class, "atan2", [ParamType::Number, ParamType::Number], |call| {
        Ok(Value::Float(MathObject::atan2(call.number(0)?, call.number(1)?)))
    })?;
    rt.register_native(
        class,
        "clamp",
        [ParamType::Number, ParamType::Number, ParamType::Number],
        |call| {
            Ok(Value::Float(MathObject::clamp(
                call.number(0)?,
                call.number(1)?,
                call.number(2)?,
            )))
        },
    )?;

    for (name, want_max) in [("min", false), ("max", true)] {
        rt.register_native(
            class,
            name,
            NativeSignature::variadic([ParamType::Number], ParamType::Number),
            move |call| {
                MathObject::extreme(call.args(), want_max).ok_or_else(|| {
                    RuntimeError::new(ErrorKind::ArgumentCountMismatch, "no values")
                })
            },
        )?;
    }
    Ok(())
}
