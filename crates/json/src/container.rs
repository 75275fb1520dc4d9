//! Shared array and object storage.
use crate::flags::{Flags, Format};
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One slot of a container.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub value: Value,
    pub flags: Flags,
    pub format: Format,
}

impl Entry {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            flags: Flags::NONE,
            format: Format::default(),
        }
    }

    pub fn with_flags(value: Value, flags: Flags) -> Self {
        Self {
            value,
            flags,
            format: Format::default(),
        }
    }

    /// Hidden entries and callables never reach serialized output.
    pub fn is_visible(&self) -> bool {
        !self.flags.is_hidden() && !matches!(self.value, Value::Callable(_))
    }

    fn deep_copy(&self, keep_format: bool) -> Entry {
        Entry {
            value: self.value.deep_copy(keep_format),
            flags: self.flags,
            format: if keep_format {
                self.format.clone()
            } else {
                Format::default()
            },
        }
    }
}

/// A shared, mutable JSON array.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Entry>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(
            values.into_iter().map(Entry::new).collect(),
        )))
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self(Rc::new(RefCell::new(entries)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).map(|e| e.value.clone())
    }

    pub fn entry(&self, index: usize) -> Option<Entry> {
        self.0.borrow().get(index).cloned()
    }

    /// Replaces the value at `index`, keeping the slot's flags and format.
    /// Returns false when the index is out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.borrow_mut().get_mut(index) {
            Some(entry) => {
                entry.value = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(Entry::new(value));
    }

    pub fn push_entry(&self, entry: Entry) {
        self.0.borrow_mut().push(entry);
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut entries = self.0.borrow_mut();
        (index < entries.len()).then(|| entries.remove(index).value)
    }

    /// Keeps the entries whose value satisfies `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&Value) -> bool) {
        self.0.borrow_mut().retain(|e| keep(&e.value));
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.borrow().iter().map(|e| e.value.clone()).collect()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn deep_copy(&self, keep_format: bool) -> Array {
        Array::from_entries(
            self.0
                .borrow()
                .iter()
                .map(|e| e.deep_copy(keep_format))
                .collect(),
        )
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}

/// A shared, mutable JSON object preserving insertion order.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<IndexMap<String, Entry>>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).map(|e| e.value.clone())
    }

    pub fn entry(&self, key: &str) -> Option<Entry> {
        self.0.borrow().get(key).cloned()
    }

    pub fn flags(&self, key: &str) -> Option<Flags> {
        self.0.borrow().get(key).map(|e| e.flags)
    }

    /// Sets `key`, keeping flags and format when the key already exists.
    pub fn insert(&self, key: String, value: Value) -> Option<Value> {
        let mut entries = self.0.borrow_mut();
        match entries.get_mut(&key) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                entries.insert(key, Entry::new(value));
                None
            }
        }
    }

    /// Sets `key` to a complete entry, replacing any flags and format.
    pub fn insert_entry(&self, key: String, entry: Entry) -> Option<Entry> {
        self.0.borrow_mut().insert(key, entry)
    }

    pub fn set_flags(&self, key: &str, flags: Flags) {
        if let Some(entry) = self.0.borrow_mut().get_mut(key) {
            entry.flags = flags;
        }
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key).map(|e| e.value)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Entry)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn deep_copy(&self, keep_format: bool) -> Object {
        let copied: IndexMap<String, Entry> = self
            .0
            .borrow()
            .iter()
            .map(|(k, e)| (k.clone(), e.deep_copy(keep_format)))
            .collect();
        Object(Rc::new(RefCell::new(copied)))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries().into_iter().map(|(k, e)| (k, e.value)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_insert_keeps_flags_of_existing_key() {
        let object = Object::new();
        object.insert_entry("a".into(), Entry::with_flags(Value::from(1), Flags::VAR));
        object.insert("a".into(), Value::from(2));
        assert_eq!(object.get("a"), Some(Value::from(2)));
        assert_eq!(object.flags("a"), Some(Flags::VAR));
    }

    #[test]
    fn test_object_remove_preserves_order() {
        let object = Object::new();
        for key in ["a", "b", "c"] {
            object.insert(key.into(), Value::Null);
        }
        object.remove("b");
        assert_eq!(object.keys(), vec!["a", "c"]);
    }

    #[test]
    fn test_array_set_and_remove() {
        let array = Array::from_values(vec![Value::from(1), Value::from(2)]);
        assert!(array.set(1, Value::from(5)));
        assert!(!array.set(4, Value::from(5)));
        assert_eq!(array.remove(0), Some(Value::from(1)));
        assert_eq!(array.values(), vec![Value::from(5)]);
        assert_eq!(array.remove(3), None);
    }
}
