//! The value enum and number representation.
use crate::callable::Callable;
use crate::container::{Array, Object};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A JSON number that remembers whether it was written as an integer.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Parses JSON number text (no leading sign). Text out of `f64` range
    /// is rejected.
    pub fn parse(text: &str) -> Option<Number> {
        let float = || text.parse::<f64>().ok().filter(|f| f.is_finite()).map(Number::Float);
        if text.contains(['.', 'e', 'E']) {
            float()
        } else {
            text.parse::<i64>().ok().map(Number::Int).or_else(float)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// The integer value, if the number is integral.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(i),
            Number::Float(f) if f.fract() == 0.0 && f.is_finite() && f.abs() < 9.0e15 => {
                Some(f as i64)
            }
            Number::Float(_) => None,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    pub fn neg(self) -> Number {
        match self {
            Number::Int(i) => i
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Float(-(i as f64))),
            Number::Float(f) => Number::Float(-f),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

/// A document value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Array),
    Object(Object),
    Callable(Rc<dyn Callable>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Callable(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Rc<dyn Callable>> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// Truthiness: `false`, `null`, `0`, `""` and empty containers are false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Callable(_) => true,
        }
    }

    /// Duplicates all container storage reachable from this value.
    pub fn deep_copy(&self, keep_format: bool) -> Value {
        match self {
            Value::Array(a) => Value::Array(a.deep_copy(keep_format)),
            Value::Object(o) => Value::Object(o.deep_copy(keep_format)),
            other => other.clone(),
        }
    }

    /// True when both values share the same container storage.
    pub fn same_storage(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Text used when the value is spliced into a string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Callable(c) => format!("<function {}>", c.name().unwrap_or("anonymous")),
            container => container.to_json().to_string(),
        }
    }

    /// Converts to a plain JSON tree, dropping hidden entries and callables.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Callable(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(Number::Int(i)) => serde_json::Value::from(*i),
            Value::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(a) => serde_json::Value::Array(
                a.entries()
                    .iter()
                    .filter(|e| e.is_visible())
                    .map(|e| e.value.to_json())
                    .collect(),
            ),
            Value::Object(o) => serde_json::Value::Object(
                o.entries()
                    .iter()
                    .filter(|(_, e)| e.is_visible())
                    .map(|(k, e)| (k.clone(), e.value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality; flags and formatting are ignored.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.ptr_eq(b) || {
                    let (left, right) = (a.values(), b.values());
                    left.len() == right.len() && left.iter().zip(right.iter()).all(|(x, y)| x == y)
                }
            }
            (Value::Object(a), Value::Object(b)) => {
                a.ptr_eq(b) || {
                    let (left, right) = (a.entries(), b.entries());
                    left.len() == right.len()
                        && left
                            .iter()
                            .all(|(k, e)| b.get(k).is_some_and(|v| v == e.value))
                }
            }
            (Value::Callable(a), Value::Callable(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", serde_json::Value::String(s.clone())),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Int(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Int(value as i64))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value)
            .map(Value::from)
            .unwrap_or(Value::Number(Number::Float(value as f64)))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(Array::from_values(values))
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_parse_keeps_integer_kind() {
        assert!(matches!(Number::parse("42"), Some(Number::Int(42))));
        assert!(matches!(Number::parse("4.5"), Some(Number::Float(f)) if f == 4.5));
        assert!(matches!(Number::parse("1e3"), Some(Number::Float(f)) if f == 1000.0));
        assert_eq!(Number::Int(2), Number::Float(2.0));
    }

    #[test]
    fn test_number_parse_rejects_out_of_range() {
        assert!(Number::parse("1e400").is_none());
        assert!(matches!(Number::parse("99999999999999999999"), Some(Number::Float(_))));
    }

    #[test]
    fn test_clone_aliases_and_deep_copy_detaches() {
        let value = Value::from(json!({ "a": [1, 2] }));
        let alias = value.clone();
        let copy = value.deep_copy(true);
        value
            .as_object()
            .unwrap()
            .insert("b".to_string(), Value::from(3));
        assert!(alias.as_object().unwrap().contains_key("b"));
        assert!(!copy.as_object().unwrap().contains_key("b"));
        assert!(value.same_storage(&alias));
        assert!(!value.same_storage(&copy));
    }

    #[test]
    fn test_structural_equality_ignores_key_order() {
        let a = Value::from(json!({ "x": 1, "y": [true, null] }));
        let b = Value::from(json!({ "y": [true, null], "x": 1.0 }));
        assert_eq!(a, b);
        assert_ne!(a, Value::from(json!({ "x": 1 })));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.truthy());
        assert!(!Value::from(0).truthy());
        assert!(!Value::from("").truthy());
        assert!(!Value::from(json!([])).truthy());
        assert!(Value::from(json!({ "a": 1 })).truthy());
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::from("plain").to_display_string(), "plain");
        assert_eq!(Value::from(1.5).to_display_string(), "1.5");
        assert_eq!(Value::from(json!([1, "a"])).to_display_string(), r#"[1,"a"]"#);
    }
}
