//! Shared model fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use remodel::{Model, Value};

/// Counter with a payload-defaulting `add` reducer: `add()` bumps by 1,
/// `add(n)` bumps by `n`.
pub fn counter_model() -> Model {
    Model::builder("counter")
        .state(Value::map([("value", 1)]))
        .reducer("add", |draft, payload| {
            let n = payload.as_i64().unwrap_or(1);
            draft.update_i64("value", |v| v + n);
        })
        .build()
}

/// `{value: 0}` model named `name` with an `inc` reducer.
pub fn value_model(name: &str) -> Model {
    Model::builder(name)
        .state(Value::map([("value", 0)]))
        .reducer("inc", |draft, _| draft.update_i64("value", |v| v + 1))
        .build()
}

pub fn value_of(state: &Value) -> i64 {
    state.get("value").and_then(Value::as_i64).unwrap_or(0)
}

/// Counter of listener invocations, cloneable into subscribe callbacks.
#[derive(Clone, Default)]
pub struct FireCount(Arc<Mutex<u64>>);

impl FireCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&self) -> impl Fn() + Send + Sync + 'static {
        let count = self.0.clone();
        move || *count.lock() += 1
    }

    pub fn get(&self) -> u64 {
        *self.0.lock()
    }
}
