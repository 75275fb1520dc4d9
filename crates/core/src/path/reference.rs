use super::Accessor;
use crate::error::JelError;
use crate::scope::Frame;
use jel_json::{Array, Flags, Object, Value};
use std::rc::Rc;

/// A location inside live document storage.
///
/// Reading goes through the container each time, and writing replaces the
/// slot in place, so every holder of the container sees the change.
#[derive(Debug, Clone)]
pub enum Reference {
    /// A temporary with no storage behind it (call results, constants).
    Value(Value),
    Key(Object, String),
    Index(Array, usize),
    Local(Rc<Frame>, String),
}

impl Reference {
    pub fn get(&self) -> Value {
        match self {
            Reference::Value(value) => value.clone(),
            Reference::Key(object, key) => object.get(key).unwrap_or_default(),
            Reference::Index(array, index) => array.get(*index).unwrap_or_default(),
            Reference::Local(frame, name) => frame.local(name).unwrap_or_default(),
        }
    }

    pub fn set(&self, value: Value) -> Result<(), JelError> {
        match self {
            Reference::Value(_) => Err(JelError::evaluation("cannot assign to a temporary value")),
            Reference::Key(object, key) => {
                object.insert(key.clone(), value);
                Ok(())
            }
            Reference::Index(array, index) => {
                if array.set(*index, value) {
                    Ok(())
                } else {
                    Err(JelError::evaluation(format!("index {} is out of bounds", index)))
                }
            }
            Reference::Local(frame, name) => {
                frame.set_local(name, value);
                Ok(())
            }
        }
    }

    pub fn flags(&self) -> Flags {
        match self {
            Reference::Key(object, key) => object.flags(key).unwrap_or_default(),
            Reference::Index(array, index) => array.entry(*index).map(|e| e.flags).unwrap_or_default(),
            Reference::Value(_) | Reference::Local(..) => Flags::NONE,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Reference::Value(_))
    }
}

impl Accessor for Reference {
    /// Private keys are invisible to key steps.
    fn child(&self, key: &str) -> Option<Self> {
        match self.get() {
            Value::Object(object) => match object.flags(key) {
                Some(flags) if !flags.contains(Flags::PRIVATE) => Some(Reference::Key(object, key.to_string())),
                _ => None,
            },
            _ => None,
        }
    }

    fn element(&self, index: usize) -> Option<Self> {
        match self.get() {
            Value::Array(array) if index < array.len() => Some(Reference::Index(array, index)),
            _ => None,
        }
    }

    fn length(&self) -> Option<usize> {
        match self.get() {
            Value::Array(array) => Some(array.len()),
            _ => None,
        }
    }
}

impl<'a> Accessor for &'a serde_json::Value {
    fn child(&self, key: &str) -> Option<Self> {
        let value: &'a serde_json::Value = *self;
        value.as_object().and_then(|object| object.get(key))
    }

    fn element(&self, index: usize) -> Option<Self> {
        let value: &'a serde_json::Value = *self;
        value.as_array().and_then(|array| array.get(index))
    }

    fn length(&self) -> Option<usize> {
        self.as_array().map(Vec::len)
    }
}
