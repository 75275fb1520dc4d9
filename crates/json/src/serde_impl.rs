//! serde integration: serialization skips hidden entries and callables.
use crate::container::{Array, Entry, Object};
use crate::value::{Number, Value};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Callable(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(f)) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Number(Number::Float(_)) => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(array) => {
                let visible: Vec<Entry> =
                    array.entries().into_iter().filter(Entry::is_visible).collect();
                let mut seq = serializer.serialize_seq(Some(visible.len()))?;
                for entry in &visible {
                    seq.serialize_element(&entry.value)?;
                }
                seq.end()
            }
            Value::Object(object) => {
                let visible: Vec<(String, Entry)> = object
                    .entries()
                    .into_iter()
                    .filter(|(_, e)| e.is_visible())
                    .collect();
                let mut map = serializer.serialize_map(Some(visible.len()))?;
                for (key, entry) in &visible {
                    map.serialize_entry(key, &entry.value)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Int(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(Array::from_values(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => {
                let object = Object::new();
                for (key, item) in map {
                    object.insert(key, Value::from(item));
                }
                Value::Object(object)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use serde_json::json;

    #[test]
    fn test_serialize_skips_hidden_entries() {
        let object = Object::new();
        object.insert("shown".into(), Value::from(1));
        object.insert_entry("secret".into(), Entry::with_flags(Value::from(2), Flags::PRIVATE));
        object.insert_entry("scratch".into(), Entry::with_flags(Value::from(3), Flags::VAR));
        let text = serde_json::to_string(&Value::Object(object)).unwrap();
        assert_eq!(text, r#"{"shown":1}"#);
    }

    #[test]
    fn test_json_round_trip() {
        let source = json!({ "a": [1, 2.5, "x", null, true], "b": { "c": {} } });
        let value = Value::from(source.clone());
        assert_eq!(value.to_json(), source);
        assert_eq!(serde_json::to_value(&value).unwrap(), source);
    }
}
