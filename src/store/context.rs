//! Execution contexts for actions and views.
//!
//! Registered functions receive their context as an explicit argument
//! rather than an implicit receiver: actions get an owned [`ActionCtx`]
//! they can hold across `.await`, views get a borrowed, read-only
//! [`ViewCtx`].

use crate::error::StoreError;
use crate::model::ActionFuture;
use crate::store::ModelStore;
use crate::value::{Draft, Value};

/// The execution context handed to an action body.
///
/// Exposes the owning store's full surface — state access, the built-in
/// `set`/`modify` transitions, sibling reducers/actions/views — plus
/// [`dep`](ActionCtx::dep) for full API access to declared dependencies.
/// State reads always observe the store's newest state, so reading after
/// an `.await` sees every dispatch that landed in between.
#[derive(Clone)]
pub struct ActionCtx {
    store: ModelStore,
}

impl ActionCtx {
    pub(crate) fn new(store: ModelStore) -> Self {
        ActionCtx { store }
    }

    /// Current state of the owning store.
    pub fn state(&self) -> Value {
        self.store.state()
    }

    /// Replace the whole state.
    pub fn set(&self, state: impl Into<Value>) -> Result<(), StoreError> {
        self.store.set(state)
    }

    /// Mutate the state through a copy-on-write draft.
    pub fn modify(
        &self,
        modifier: impl Fn(&mut Draft) + Send + Sync + 'static,
    ) -> Result<(), StoreError> {
        self.store.modify(modifier)
    }

    /// Invoke a sibling reducer by name.
    pub fn reducer(&self, name: &str, payload: impl Into<Value>) -> Result<(), StoreError> {
        self.store.reducer(name, payload)
    }

    /// Invoke a sibling action by name. Boxed, so actions may call each
    /// other recursively.
    pub fn action(&self, name: &str, payload: impl Into<Value>) -> ActionFuture {
        self.store.action(name, payload)
    }

    /// Invoke a sibling view by name.
    pub fn view(&self, name: &str, args: impl Into<Value>) -> Result<Value, StoreError> {
        self.store.view(name, args)
    }

    /// Full store handle for a declared dependency. Mutation through the
    /// handle funnels through that store's own dispatch, so its listeners
    /// and dependents are notified normally.
    pub fn dep(&self, name: &str) -> Result<ModelStore, StoreError> {
        self.store.dep(name)
    }
}

/// The execution context handed to a view body.
///
/// Views are pure: the context exposes reads only, so a view cannot
/// dispatch or otherwise change state.
pub struct ViewCtx<'a> {
    store: &'a ModelStore,
}

impl<'a> ViewCtx<'a> {
    pub(crate) fn new(store: &'a ModelStore) -> Self {
        ViewCtx { store }
    }

    /// Current state of the owning store.
    pub fn state(&self) -> Value {
        self.store.state()
    }

    /// Invoke a sibling view by name.
    pub fn view(&self, name: &str, args: impl Into<Value>) -> Result<Value, StoreError> {
        self.store.view(name, args)
    }

    /// Current state of a declared dependency.
    pub fn dep_state(&self, name: &str) -> Result<Value, StoreError> {
        Ok(self.store.dep(name)?.state())
    }

    /// Invoke a view declared on a dependency.
    pub fn dep_view(
        &self,
        name: &str,
        view: &str,
        args: impl Into<Value>,
    ) -> Result<Value, StoreError> {
        self.store.dep(name)?.view(view, args)
    }
}
