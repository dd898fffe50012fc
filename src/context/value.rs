//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents every value a
//! template can read from its context or compute while rendering. Values are
//! tagged; printing and truthiness follow fixed rules instead of coercions.
//!
//! # Value Types
//!
//! - [`Value::Integer`]: 64-bit signed integer
//! - [`Value::String`]: UTF-8 text
//! - [`Value::Boolean`]: `true` / `false`
//! - [`Value::List`]: ordered sequence of values
//! - [`Value::Map`]: string-keyed mapping, traversed by dotted paths
//! - [`Value::Callable`]: a template-defined function
//! - [`Value::Absent`]: result of looking up a name that is not bound
//!
//! # Absent Values
//!
//! An unresolved variable path is not an error. It yields `Absent`, which is
//! falsy and prints as empty text.

use crate::parser::ast::Block;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Runtime values in the renderer
#[derive(Debug, Clone, Default)]
pub enum Value {
    Integer(i64),
    String(String),
    Boolean(bool),
    List(Vec<Value>),
    Map(FxHashMap<String, Value>), // Key -> value
    Callable(Arc<Callable>),
    #[default]
    Absent,
}

/// A template-defined function together with the bindings visible where
/// it was defined
pub struct Callable {
    pub name: String,
    pub params: Vec<String>,
    pub body: Arc<Block>,
    pub captured: Arc<FxHashMap<String, Value>>,
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("captured", &self.captured.len())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Functions are equal only to themselves
            (Value::Callable(a), Value::Callable(b)) => Arc::ptr_eq(a, b),
            (Value::Absent, Value::Absent) => true,
            _ => false,
        }
    }
}

impl Value {
    /// Name of the value's kind, used in type error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
            Value::Callable(_) => "function",
            Value::Absent => "absent",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Truthiness used by `if`, `while`, `and`, `or` and `not`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Callable(_) => true,
            Value::Absent => false,
        }
    }

    /// Text produced when the value is printed. `None` for kinds that have
    /// no printed form (lists, mappings, functions).
    pub fn to_output(&self) -> Option<String> {
        match self {
            Value::Integer(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Absent => Some(String::new()),
            Value::List(_) | Value::Map(_) | Value::Callable(_) => None,
        }
    }

    /// Get the integer value, returns None if not an Integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Member of a mapping; anything else has no members
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Follow `path` through nested mappings. A missing key or a
    /// non-mapping intermediate yields [`Value::Absent`].
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Value {
        let mut current = self;
        for key in path {
            match current.get(key.as_ref()) {
                Some(next) => current = next,
                None => return Value::Absent,
            }
        }
        current.clone()
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<FxHashMap<String, Value>> for Value {
    fn from(map: FxHashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Nulls become absent, floats are truncated toward zero, objects become
/// mappings (dropping null members).
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Absent,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                // `as` saturates out-of-range floats
                None => Value::Integer(n.as_f64().map_or(0, |f| f.trunc() as i64)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(members) => Value::Map(
                members
                    .into_iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(Value::Integer(-1).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(vec![1]).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Absent.is_truthy());
    }

    #[test]
    fn test_output() {
        assert_eq!(Value::Integer(-42).to_output().as_deref(), Some("-42"));
        assert_eq!(Value::Boolean(true).to_output().as_deref(), Some("true"));
        assert_eq!(Value::from("hi").to_output().as_deref(), Some("hi"));
        assert_eq!(Value::Absent.to_output().as_deref(), Some(""));
        assert_eq!(Value::from(vec!["a"]).to_output(), None);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(7).as_int(), Some(7));
        assert_eq!(Value::from("7").as_int(), None);
        assert_eq!(Value::from("page").as_str(), Some("page"));
        assert_eq!(Value::Absent.as_str(), None);
        assert_eq!(Value::from(vec![1, 2]).as_list(), Some(&[Value::Integer(1), Value::Integer(2)][..]));
        assert_eq!(Value::Boolean(true).as_list(), None);
    }

    #[test]
    fn test_get_path_through_mappings() {
        let page: Value = [("meta", [("title", "Home")].into_iter().collect::<Value>())]
            .into_iter()
            .collect();
        assert_eq!(page.get_path(&["meta", "title"]), Value::from("Home"));
        assert_eq!(page.get_path(&["meta", "missing"]), Value::Absent);
        // Traversing through a string is absent, not an error
        assert_eq!(page.get_path(&["meta", "title", "len"]), Value::Absent);
        assert_eq!(page.get_path::<&str>(&[]), page);
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({
            "count": 3,
            "ratio": -2.7,
            "draft": false,
            "tags": ["a", null],
            "gone": null
        }));
        assert_eq!(value.get("count"), Some(&Value::Integer(3)));
        assert_eq!(value.get("ratio"), Some(&Value::Integer(-2)));
        assert_eq!(value.get("draft"), Some(&Value::Boolean(false)));
        assert_eq!(
            value.get("tags"),
            Some(&Value::List(vec![Value::from("a"), Value::Absent]))
        );
        assert_eq!(value.get("gone"), None);
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::from(vec![1, 2]), Value::from(vec![1, 2]));
        assert_ne!(Value::Integer(1), Value::from("1"));
        assert_ne!(Value::Integer(0), Value::Absent);
    }
}
