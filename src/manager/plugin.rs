//! Lifecycle observer hooks.
//!
//! Plugins observe the manager through a small hook trait; they never see
//! store internals. The handle passed to `on_store_created` is
//! intentionally narrow — an explicit capability surface instead of a
//! dynamic allow-list, so anything outside it is unreachable at compile
//! time.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::StoreError;
use crate::manager::Manager;
use crate::model::Model;
use crate::store::{Action, StoreInner, Subscription};
use crate::value::{Draft, Value};

/// Lifecycle observer. All members default to no-ops; implement the points
/// you care about.
pub trait Hook: Send + Sync {
    /// Manager creation. The initial-state table is mutable so a
    /// persistence-style plugin can hydrate it before any store is built.
    fn on_init(&self, manager: &Manager, initial_state: &mut BTreeMap<String, Value>) {
        let _ = (manager, initial_state);
    }

    /// Just before a model's store construction begins.
    fn on_model(&self, model: &Model) {
        let _ = model;
    }

    /// Just after a store finishes construction.
    fn on_store_created(&self, store: &PluginStore) {
        let _ = store;
    }

    /// Manager teardown, before any store is destroyed.
    fn on_destroy(&self) {}
}

/// Capability-restricted store handle for observer hooks.
///
/// Reachable surface: `state`, `dispatch`, `subscribe`, `model`, `set`,
/// `modify`, and the pure composed reducer via [`reduce`](PluginStore::reduce).
pub struct PluginStore {
    inner: Arc<StoreInner>,
}

impl PluginStore {
    pub(crate) fn new(inner: Arc<StoreInner>) -> Self {
        PluginStore { inner }
    }

    /// Current state, with the manager's mode deciding snapshot semantics.
    pub fn state(&self) -> Value {
        self.inner.state_view()
    }

    /// The definition this store was built from.
    pub fn model(&self) -> &Model {
        self.inner.model()
    }

    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        self.inner.dispatch(action)
    }

    pub fn subscribe(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Result<Subscription, StoreError> {
        self.inner.subscribe(listener)
    }

    pub fn set(&self, state: impl Into<Value>) -> Result<(), StoreError> {
        self.inner.dispatch(Action::replace(state)).map(drop)
    }

    pub fn modify(
        &self,
        modifier: impl Fn(&mut Draft) + Send + Sync + 'static,
    ) -> Result<(), StoreError> {
        self.inner.dispatch(Action::mutate(modifier)).map(drop)
    }

    /// Run the composed transition function against an arbitrary state,
    /// without touching the store. This is the surface time-travel
    /// inspectors replay through.
    pub fn reduce(&self, state: &Value, action: &Action) -> Result<Value, StoreError> {
        self.inner.reduce_pure(state, action)
    }
}

impl std::fmt::Debug for PluginStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginStore")
            .field("model", &self.inner.model().name())
            .finish()
    }
}
