//! Typed accessors over webhook payloads
//!
//! Payloads are arbitrary JSON. These accessors return `Option` instead of
//! panicking or guessing, so a missing key, a wrong container type, and an
//! out-of-range index all look the same to callers: `None`.

use serde_json::Value;

pub trait PayloadExt {
    /// Look up a key on an object
    fn field(&self, key: &str) -> Option<&Value>;

    /// Index into an array
    fn item(&self, index: usize) -> Option<&Value>;

    /// The value itself unless it is `null`
    fn present(&self) -> Option<&Value>;

    /// Text form of a scalar; `None` for null, arrays and objects
    fn scalar_text(&self) -> Option<String>;

    /// Null, or a string that is empty after trimming
    fn is_blank(&self) -> bool;
}

impl PayloadExt for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn item(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    fn present(&self) -> Option<&Value> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }

    fn scalar_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}
