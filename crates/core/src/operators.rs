//! Value-level semantics of the arithmetic, relational and unary operators.
//!
//! Operands are never modified: containers taking part in an operation are
//! deep-copied into the result.
use crate::ast::{ArithmeticOperator, RelationalOperator, UnaryOperator};
use crate::error::JelError;
use jel_json::{Array, Number, Object, Value};
use std::cmp::Ordering;

pub fn evaluate_arithmetic(op: ArithmeticOperator, left: &Value, right: &Value) -> Result<Value, JelError> {
    match op {
        ArithmeticOperator::Add => add(left, right),
        ArithmeticOperator::Subtract => subtract(left, right),
        ArithmeticOperator::Multiply => multiply(left, right),
        ArithmeticOperator::Divide => divide(left, right),
        ArithmeticOperator::Modulo => modulo(left, right),
    }
}

pub fn evaluate_comparison(op: RelationalOperator, left: &Value, right: &Value) -> Result<bool, JelError> {
    match op {
        RelationalOperator::Equal => Ok(left == right),
        RelationalOperator::NotEqual => Ok(left != right),
        RelationalOperator::Less => compare(op, left, right, |ord| ord == Ordering::Less),
        RelationalOperator::LessEqual => compare(op, left, right, |ord| ord != Ordering::Greater),
        RelationalOperator::Greater => compare(op, left, right, |ord| ord == Ordering::Greater),
        RelationalOperator::GreaterEqual => compare(op, left, right, |ord| ord != Ordering::Less),
    }
}

pub fn evaluate_unary(op: UnaryOperator, value: &Value) -> Result<Value, JelError> {
    match (op, value) {
        (UnaryOperator::Not, value) => Ok(Value::Bool(!value.truthy())),
        (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(n.neg())),
        (UnaryOperator::Negate, other) => Err(JelError::evaluation(format!(
            "cannot negate a {}",
            other.type_name()
        ))),
    }
}

fn unsupported(symbol: &str, left: &Value, right: &Value) -> JelError {
    JelError::evaluation(format!(
        "cannot apply '{}' to {} and {}",
        symbol,
        left.type_name(),
        right.type_name()
    ))
}

/// Integer arithmetic when both sides are integers and the result fits,
/// floating point otherwise.
fn numeric(
    left: Number,
    right: Number,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Value {
    if let (Number::Int(a), Number::Int(b)) = (left, right) {
        if let Some(result) = int(a, b) {
            return Value::Number(Number::Int(result));
        }
    }
    Value::Number(Number::Float(float(left.as_f64(), right.as_f64())))
}

fn add(left: &Value, right: &Value) -> Result<Value, JelError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(numeric(*a, *b, i64::checked_add, |a, b| a + b)),
        (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b.to_display_string()))),
        (a, Value::String(b)) if !a.is_container() => Ok(Value::String(format!("{}{}", a.to_display_string(), b))),
        (Value::Object(a), Value::Object(b)) => {
            let merged = a.deep_copy(true);
            for (key, entry) in b.deep_copy(true).entries() {
                merged.insert_entry(key, entry);
            }
            Ok(Value::Object(merged))
        }
        (Value::Array(a), Value::Array(b)) => {
            let joined = a.deep_copy(true);
            for entry in b.deep_copy(true).entries() {
                joined.push_entry(entry);
            }
            Ok(Value::Array(joined))
        }
        (Value::Array(a), b) => {
            let appended = a.deep_copy(true);
            appended.push(b.deep_copy(true));
            Ok(Value::Array(appended))
        }
        (a, Value::Array(b)) => {
            let mut values = vec![a.deep_copy(true)];
            values.extend(b.deep_copy(true).values());
            Ok(Value::Array(Array::from_values(values)))
        }
        _ => Err(unsupported("+", left, right)),
    }
}

fn subtract(left: &Value, right: &Value) -> Result<Value, JelError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(numeric(*a, *b, i64::checked_sub, |a, b| a - b)),
        (Value::Object(a), Value::Object(b)) => Ok(Value::Object(object_difference(a, b))),
        (Value::Object(a), Value::String(key)) => {
            let result = a.deep_copy(true);
            result.remove(key);
            Ok(Value::Object(result))
        }
        (Value::Object(a), Value::Array(keys)) => {
            let result = a.deep_copy(true);
            for key in keys.values() {
                let key = key.as_str().ok_or_else(|| {
                    JelError::evaluation(format!("cannot remove a {} key from an object", key.type_name()))
                })?;
                result.remove(key);
            }
            Ok(Value::Object(result))
        }
        (Value::Array(a), Value::Array(b)) => Ok(Value::Array(array_difference(a, &b.values()))),
        (Value::Array(a), b) => Ok(Value::Array(array_difference(a, std::slice::from_ref(b)))),
        _ => Err(unsupported("-", left, right)),
    }
}

/// `left` without what `right` names: a `null` removes the key, nested
/// objects recurse, arrays drop the listed elements, equal values go.
fn object_difference(left: &Object, right: &Object) -> Object {
    let result = left.deep_copy(true);
    for (key, entry) in right.entries() {
        let Some(current) = result.get(&key) else {
            continue;
        };
        match (&current, &entry.value) {
            (_, Value::Null) => {
                result.remove(&key);
            }
            (Value::Object(a), Value::Object(b)) => {
                result.insert(key, Value::Object(object_difference(a, b)));
            }
            (Value::Array(a), Value::Array(b)) => {
                result.insert(key, Value::Array(array_difference(a, &b.values())));
            }
            (a, b) if a == b => {
                result.remove(&key);
            }
            _ => {}
        }
    }
    result
}

fn array_difference(left: &Array, remove: &[Value]) -> Array {
    let result = left.deep_copy(true);
    result.retain(|value| !remove.contains(value));
    result
}

fn multiply(left: &Value, right: &Value) -> Result<Value, JelError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(numeric(*a, *b, i64::checked_mul, |a, b| a * b)),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            Ok(Value::String(s.repeat(repetitions(*n)?)))
        }
        (container, Value::Number(n)) if container.is_container() => {
            let copies = (0..repetitions(*n)?).map(|_| container.deep_copy(true)).collect();
            Ok(Value::Array(Array::from_values(copies)))
        }
        _ => Err(unsupported("*", left, right)),
    }
}

fn repetitions(n: Number) -> Result<usize, JelError> {
    n.as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| JelError::evaluation(format!("cannot repeat {} times", n)))
}

fn divisor(symbol: &str, left: &Value, right: &Value) -> Result<(Number, Number), JelError> {
    match (left, right) {
        (Value::Number(_), Value::Number(b)) if b.is_zero() => Err(JelError::evaluation("division by zero")),
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(unsupported(symbol, left, right)),
    }
}

fn divide(left: &Value, right: &Value) -> Result<Value, JelError> {
    let (a, b) = divisor("/", left, right)?;
    Ok(numeric(
        a,
        b,
        |a, b| (a.checked_rem(b) == Some(0)).then(|| a.checked_div(b)).flatten(),
        |a, b| a / b,
    ))
}

fn modulo(left: &Value, right: &Value) -> Result<Value, JelError> {
    let (a, b) = divisor("%", left, right)?;
    Ok(numeric(a, b, i64::checked_rem, |a, b| a % b))
}

fn compare(
    op: RelationalOperator,
    left: &Value,
    right: &Value,
    accept: impl Fn(Ordering) -> bool,
) -> Result<bool, JelError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering
        .map(accept)
        .ok_or_else(|| unsupported(op.symbol(), left, right))
}
