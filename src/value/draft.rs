//! Copy-on-write working copies for state transitions.

use super::Value;

/// A mutable working copy of a [`Value`].
///
/// Reducers and `modify` closures receive a `Draft` instead of the state
/// itself. Reads (`get`, `get_in`, `value`) never disturb the original.
/// Writes copy only the spine they touch, so committing a draft shares
/// every untouched subtree with the pre-transition state.
///
/// A draft that was never written commits to the *exact* prior value (same
/// `Arc`s), which is how a no-op `Mutate` produces no change notification.
pub struct Draft {
    original: Value,
    working: Value,
    touched: bool,
}

impl Draft {
    pub(crate) fn new(value: Value) -> Self {
        Draft {
            working: value.clone(),
            original: value,
            touched: false,
        }
    }

    /// The current working value, including any mutations so far.
    pub fn value(&self) -> &Value {
        &self.working
    }

    /// Map-field read. Does not mark the draft as written.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.working.get(key)
    }

    /// Nested map-field read along a key path.
    pub fn get_in(&self, path: &[&str]) -> Option<&Value> {
        self.working.get_in(path)
    }

    /// Overwrite a top-level map field.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.set_in(&[key], value);
    }

    /// Overwrite the field at a key path, creating intermediate maps as
    /// needed.
    pub fn set_in(&mut self, path: &[&str], value: impl Into<Value>) {
        self.touched = true;
        self.working.set_path(path, value.into());
    }

    /// Remove a top-level map field. Removing an absent field still counts
    /// as a write.
    pub fn remove(&mut self, key: &str) {
        self.remove_in(&[key]);
    }

    /// Remove the map field at a key path.
    pub fn remove_in(&mut self, path: &[&str]) {
        self.touched = true;
        self.working.remove_path(path);
    }

    /// Append to the list at a top-level field, creating it when absent.
    pub fn push(&mut self, key: &str, value: impl Into<Value>) {
        self.touched = true;
        self.working.push_path(&[key], value.into());
    }

    /// Replace the entire working value.
    pub fn replace(&mut self, value: impl Into<Value>) {
        self.touched = true;
        self.working = value.into();
    }

    /// Update a top-level integer field in place. Fields that are missing
    /// or non-integer read as 0.
    pub fn update_i64(&mut self, key: &str, f: impl FnOnce(i64) -> i64) {
        let current = self.get(key).and_then(Value::as_i64).unwrap_or(0);
        self.set(key, f(current));
    }

    /// Finish the draft: the working value when written, otherwise the
    /// untouched original.
    pub(crate) fn commit(self) -> Value {
        if self.touched {
            self.working
        } else {
            self.original
        }
    }
}
