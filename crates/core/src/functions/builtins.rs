//! Built-in function implementations.
use super::{Builtin, BuiltinFn, FunctionRegistry};
use crate::config::Privileges;
use crate::context::JelContext;
use crate::error::JelError;
use jel_json::{Array, Number, Value};
use regex::Regex;
use std::path::Path;

pub(super) fn register_all(registry: &mut FunctionRegistry) {
    let pure: &[(&'static str, Option<usize>, BuiltinFn)] = &[
        ("size", Some(1), size),
        ("keys", Some(1), keys),
        ("values", Some(1), values),
        ("type", Some(1), type_of),
        ("upper", Some(1), upper),
        ("lower", Some(1), lower),
        ("concat", None, concat),
        ("contains", Some(2), contains),
        ("matches", Some(2), matches),
        ("range", Some(2), range),
        ("string", Some(1), string),
        ("number", Some(1), number),
        ("join", Some(2), join),
        ("split", Some(2), split),
        ("round", Some(1), round),
    ];
    for &(name, arity, func) in pure {
        registry.register(Builtin {
            name,
            arity,
            privileges: Privileges::NONE,
            func,
        });
    }
    registry.register(Builtin {
        name: "env",
        arity: Some(1),
        privileges: Privileges::ENV,
        func: env,
    });
    registry.register(Builtin {
        name: "read",
        arity: Some(1),
        privileges: Privileges::FILES,
        func: read,
    });
}

fn type_error(function: &str, expected: &str, found: &Value) -> JelError {
    JelError::evaluation(format!(
        "{}() expects {}, found {}",
        function,
        expected,
        found.type_name()
    ))
}

fn string_arg<'v>(function: &str, args: &'v [Value], index: usize) -> Result<&'v str, JelError> {
    let value = args.get(index).unwrap_or(&Value::Null);
    value.as_str().ok_or_else(|| type_error(function, "a string", value))
}

fn integer_arg(function: &str, args: &[Value], index: usize) -> Result<i64, JelError> {
    let value = args.get(index).unwrap_or(&Value::Null);
    value.as_i64().ok_or_else(|| type_error(function, "an integer", value))
}

fn size(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    match &args[0] {
        Value::String(s) => Ok(Value::from(s.chars().count())),
        Value::Array(array) => Ok(Value::from(array.len())),
        Value::Object(object) => Ok(Value::from(object.entries().iter().filter(|(_, e)| e.is_visible()).count())),
        other => Err(type_error("size", "a string, array or object", other)),
    }
}

fn keys(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let object = args[0].as_object().ok_or_else(|| type_error("keys", "an object", &args[0]))?;
    let keys = object
        .entries()
        .into_iter()
        .filter(|(_, entry)| entry.is_visible())
        .map(|(key, _)| Value::from(key))
        .collect();
    Ok(Value::Array(Array::from_values(keys)))
}

fn values(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let object = args[0].as_object().ok_or_else(|| type_error("values", "an object", &args[0]))?;
    let values = object
        .entries()
        .into_iter()
        .filter(|(_, entry)| entry.is_visible())
        .map(|(_, entry)| entry.value)
        .collect();
    Ok(Value::Array(Array::from_values(values)))
}

fn type_of(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    Ok(Value::from(args[0].type_name()))
}

fn upper(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    Ok(Value::from(string_arg("upper", &args, 0)?.to_uppercase()))
}

fn lower(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    Ok(Value::from(string_arg("lower", &args, 0)?.to_lowercase()))
}

fn concat(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    Ok(Value::from(args.iter().map(Value::to_display_string).collect::<String>()))
}

fn contains(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let found = match (&args[0], &args[1]) {
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        (Value::Array(array), needle) => array.values().iter().any(|v| v == needle),
        (Value::Object(object), Value::String(key)) => object.entry(key).is_some_and(|e| e.is_visible()),
        (other, _) => return Err(type_error("contains", "a string, array or object", other)),
    };
    Ok(Value::Bool(found))
}

fn matches(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let text = string_arg("matches", &args, 0)?;
    let pattern = string_arg("matches", &args, 1)?;
    let regex = Regex::new(pattern)
        .map_err(|e| JelError::evaluation(format!("matches(): invalid pattern '{}'", pattern)).with_details(e.to_string()))?;
    Ok(Value::Bool(regex.is_match(text)))
}

/// Inclusive integer range; empty when `from > to`.
fn range(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let from = integer_arg("range", &args, 0)?;
    let to = integer_arg("range", &args, 1)?;
    let values = (from..=to).map(|i| Value::Number(Number::Int(i))).collect();
    Ok(Value::Array(Array::from_values(values)))
}

fn string(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    Ok(Value::from(args[0].to_display_string()))
}

fn number(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            let (negative, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, trimmed),
            };
            Number::parse(digits)
                .map(|n| Value::Number(if negative { n.neg() } else { n }))
                .ok_or_else(|| JelError::evaluation(format!("number(): '{}' is not a number", s)))
        }
        other => Err(type_error("number", "a string, number or boolean", other)),
    }
}

fn join(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let array = args[0].as_array().ok_or_else(|| type_error("join", "an array", &args[0]))?;
    let separator = string_arg("join", &args, 1)?;
    let parts: Vec<String> = array.values().iter().map(Value::to_display_string).collect();
    Ok(Value::from(parts.join(separator)))
}

fn split(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let text = string_arg("split", &args, 0)?;
    let separator = string_arg("split", &args, 1)?;
    let parts = if separator.is_empty() {
        text.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        text.split(separator).map(Value::from).collect()
    };
    Ok(Value::Array(Array::from_values(parts)))
}

fn round(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    match &args[0] {
        Value::Number(Number::Int(i)) => Ok(Value::from(*i)),
        Value::Number(Number::Float(f)) => {
            let rounded = f.round();
            Ok(Number::Float(rounded)
                .as_i64()
                .map(Value::from)
                .unwrap_or(Value::from(rounded)))
        }
        other => Err(type_error("round", "a number", other)),
    }
}

fn env(_ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let name = string_arg("env", &args, 0)?;
    Ok(std::env::var(name).map(Value::from).unwrap_or(Value::Null))
}

/// Reads a text file relative to the file being evaluated.
fn read(ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError> {
    let path = string_arg("read", &args, 0)?;
    let base = ctx.current_file().and_then(Path::parent).map(Path::to_path_buf);
    let loader = ctx.loader();
    let resolved = loader
        .resolve(base.as_deref(), path)
        .map_err(|e| JelError::evaluation(format!("read(): {}", e)))?;
    let text = loader
        .load(&resolved)
        .map_err(|e| JelError::evaluation(format!("read(): {}", e)))?;
    Ok(Value::from(text))
}
