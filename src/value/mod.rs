//! Immutable structured values with structural sharing.
//!
//! `Value` is the state type every store holds. Container variants share
//! their contents through `Arc`, so cloning a value is cheap and two values
//! produced from one another keep identical subtrees pointer-equal. Change
//! detection throughout the crate uses [`Value::same`] (shallow identity),
//! while `PartialEq` stays deep equality for assertions.

mod draft;

pub use draft::Draft;

use std::collections::BTreeMap;
use std::sync::Arc;

/// A structured state value.
///
/// Scalars are stored inline; strings, lists, and maps are `Arc`-shared so
/// untouched subtrees survive a transition with their identity intact.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<Vec<Value>>),
    Map(Arc<BTreeMap<String, Value>>),
}

impl Value {
    /// Shallow identity comparison: pointer equality for shared containers,
    /// value equality for scalars.
    ///
    /// This is the "did state actually change" check. A transition that
    /// rebuilds a map node yields `same == false` even when the contents
    /// are deep-equal, mirroring reference-equality change detection.
    pub fn same(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
            (Value::Str(x), Value::Str(y)) => Arc::ptr_eq(x, y),
            (Value::List(x), Value::List(y)) => Arc::ptr_eq(x, y),
            (Value::Map(x), Value::Map(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// Fully detached copy: fresh `Arc`s at every node.
    ///
    /// Used by strict-mode state snapshots, which must not leak shared
    /// internal structure to callers.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Str(s) => Value::Str(Arc::from(&**s)),
            Value::List(items) => {
                Value::List(Arc::new(items.iter().map(Value::deep_clone).collect()))
            }
            Value::Map(entries) => Value::Map(Arc::new(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect(),
            )),
            other => other.clone(),
        }
    }

    /// Map-field lookup. `None` for missing keys and non-map values.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Nested map-field lookup along a key path.
    pub fn get_in(&self, path: &[&str]) -> Option<&Value> {
        let mut current = self;
        for key in path {
            current = current.get(key)?;
        }
        Some(current)
    }

    /// List-element lookup. `None` for out-of-range and non-list values.
    pub fn index(&self, idx: usize) -> Option<&Value> {
        match self {
            Value::List(items) => items.get(idx),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Map literal from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// List literal from values.
    pub fn list<V, I>(items: I) -> Value
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Overwrite the value at a key path, copying only the written spine.
    ///
    /// Missing or non-map intermediates become maps. Every node along the
    /// path is detached via `Arc::make_mut`; siblings keep their shared
    /// `Arc`s, which is what preserves structural sharing.
    pub(crate) fn set_path(&mut self, path: &[&str], value: Value) {
        let Some((head, rest)) = path.split_first() else {
            *self = value;
            return;
        };
        if !matches!(self, Value::Map(_)) {
            *self = Value::Map(Arc::new(BTreeMap::new()));
        }
        let Value::Map(entries) = self else {
            unreachable!()
        };
        let entries = Arc::make_mut(entries);
        let child = entries.entry((*head).to_string()).or_insert(Value::Null);
        child.set_path(rest, value);
    }

    /// Remove a map key along a path. No-op when the path does not resolve
    /// to a map entry.
    pub(crate) fn remove_path(&mut self, path: &[&str]) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };
        let Value::Map(entries) = self else {
            return;
        };
        let entries = Arc::make_mut(entries);
        if rest.is_empty() {
            entries.remove(*head);
        } else if let Some(child) = entries.get_mut(*head) {
            child.remove_path(rest);
        }
    }

    /// Append to the list at a key path, creating the list when absent.
    pub(crate) fn push_path(&mut self, path: &[&str], value: Value) {
        let Some((head, rest)) = path.split_first() else {
            match self {
                Value::List(items) => Arc::make_mut(items).push(value),
                _ => *self = Value::list([value]),
            }
            return;
        };
        if !matches!(self, Value::Map(_)) {
            *self = Value::Map(Arc::new(BTreeMap::new()));
        }
        let Value::Map(entries) = self else {
            unreachable!()
        };
        let entries = Arc::make_mut(entries);
        let child = entries.entry((*head).to_string()).or_insert(Value::Null);
        child.push_path(rest, value);
    }
}

/// Deep equality. Identity checks go through [`Value::same`] instead.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::List(x), Value::List(y)) => x == y,
            (Value::Map(x), Value::Map(y)) => x == y,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Int(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Value {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(Arc::from(s.as_str()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::List(Arc::new(items))
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Value {
        Value::Map(Arc::new(entries))
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(opt: Option<V>) -> Value {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::List(Arc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(entries) => Value::Map(Arc::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> serde_json::Value {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_is_pointer_identity_for_containers() {
        let a = Value::map([("x", 1)]);
        let b = a.clone();
        let c = Value::map([("x", 1)]);
        assert!(Value::same(&a, &b));
        assert!(!Value::same(&a, &c));
        assert_eq!(a, c);
    }

    #[test]
    fn set_path_preserves_sibling_identity() {
        let state = Value::map([
            ("a", Value::map([("x", 1)])),
            ("b", Value::map([("y", 2)])),
        ]);
        let mut next = state.clone();
        next.set_path(&["b", "y"], Value::Int(3));

        assert!(Value::same(state.get("a").unwrap(), next.get("a").unwrap()));
        assert!(!Value::same(state.get("b").unwrap(), next.get("b").unwrap()));
        assert_eq!(next.get_in(&["b", "y"]), Some(&Value::Int(3)));
        assert_eq!(state.get_in(&["b", "y"]), Some(&Value::Int(2)));
    }

    #[test]
    fn deep_clone_detaches_every_node() {
        let state = Value::map([("items", Value::list([1, 2, 3]))]);
        let clone = state.deep_clone();
        assert_eq!(state, clone);
        assert!(!Value::same(&state, &clone));
        assert!(!Value::same(
            state.get("items").unwrap(),
            clone.get("items").unwrap()
        ));
    }

    #[test]
    fn json_round_trip() {
        let json: serde_json::Value = serde_json::json!({
            "name": "counter",
            "value": 5,
            "history": [1, 2.5, null, true],
        });
        let value = Value::from(json.clone());
        assert_eq!(serde_json::Value::from(&value), json);
    }
}
