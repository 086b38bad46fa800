//! Live store runtime.
//!
//! A store is the runtime instance of one model within one manager: it
//! owns the current state, the composed transition function, the listener
//! set, and the dependency links. All mutation funnels through
//! [`dispatch`](ModelStore::dispatch); a dispatch that actually changes
//! state notifies this store's listeners and then, one hop, the listeners
//! of every store that depends on it.

mod context;
mod pipeline;

pub use context::{ActionCtx, ViewCtx};
pub use pipeline::{Action, Modifier};

pub(crate) use pipeline::compose;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::error::StoreError;
use crate::manager::Mode;
use crate::model::{ActionFuture, Model};
use crate::store::pipeline::{ActionKind, ReduceFn};
use crate::value::{Draft, Value};

type Listener = Arc<dyn Fn() + Send + Sync>;

pub(crate) struct StoreInner {
    model: Model,
    reduce: ReduceFn,
    mode: Mode,
    state: RwLock<Value>,
    listeners: Mutex<BTreeMap<u64, Listener>>,
    next_listener_id: AtomicU64,
    /// Stores that depend on this one. Back-references only, held weakly:
    /// this store never constructs or destroys its dependents.
    dependents: Mutex<Vec<Weak<StoreInner>>>,
    /// Handles to the stores this one depends on, keyed by model name.
    depends: RwLock<BTreeMap<String, Arc<StoreInner>>>,
    dispatching: AtomicBool,
    /// Strict-mode detached snapshot, cached against the state identity it
    /// was taken from.
    snapshot: Mutex<Option<(Value, Value)>>,
}

impl StoreInner {
    /// Build the store: compose the pipeline, seed state, and run the
    /// one-time `Init` dispatch that establishes the sharing baseline.
    ///
    /// A pending initial-state entry overrides the model's declared
    /// default; an explicit `Null` entry counts as consumed but falls back
    /// to the default.
    pub(crate) fn new(model: Model, initial: Option<Value>, mode: Mode) -> Result<Self, StoreError> {
        let reduce = compose(&model);
        let state = initial
            .filter(|value| !value.is_null())
            .unwrap_or_else(|| model.initial_state().clone());
        let store = StoreInner {
            model,
            reduce,
            mode,
            state: RwLock::new(state),
            listeners: Mutex::new(BTreeMap::new()),
            next_listener_id: AtomicU64::new(0),
            dependents: Mutex::new(Vec::new()),
            depends: RwLock::new(BTreeMap::new()),
            dispatching: AtomicBool::new(false),
            snapshot: Mutex::new(None),
        };
        store.dispatch(Action::init())?;
        Ok(store)
    }

    pub(crate) fn model(&self) -> &Model {
        &self.model
    }

    /// Current state reference. O(1), never fails.
    pub(crate) fn state_raw(&self) -> Value {
        self.state.read().clone()
    }

    /// `$state` semantics: relaxed mode hands out the live (Arc-shared)
    /// value; strict mode hands out a detached deep clone whose identity
    /// changes only when the state actually changed.
    pub(crate) fn state_view(&self) -> Value {
        let current = self.state_raw();
        match self.mode {
            Mode::Relaxed => current,
            Mode::Strict => {
                let mut cache = self.snapshot.lock();
                if let Some((seen, snap)) = &*cache {
                    if Value::same(seen, &current) {
                        return snap.clone();
                    }
                }
                let snap = current.deep_clone();
                *cache = Some((current, snap.clone()));
                snap
            }
        }
    }

    /// Run the pipeline and commit the result on identity change.
    ///
    /// Reentrancy-guarded: a transition function may not dispatch on this
    /// store while its own dispatch is in flight. Listeners run after the
    /// guard is released and may themselves dispatch.
    pub(crate) fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        if let ActionKind::Named { name, .. } = action.kind() {
            if name.is_empty() {
                return Err(StoreError::MissingActionType {
                    model: self.model.name().to_string(),
                });
            }
        }
        if self
            .dispatching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StoreError::DispatchInProgress {
                model: self.model.name().to_string(),
            });
        }
        let next = {
            // Release the flag even if the transition function panics.
            let _release = scopeguard::guard((), |_| {
                self.dispatching.store(false, Ordering::SeqCst);
            });
            let current = self.state_raw();
            (self.reduce)(&current, &action)?
        };

        let changed = {
            let mut state = self.state.write();
            if Value::same(&state, &next) {
                false
            } else {
                *state = next;
                true
            }
        };
        if changed {
            self.notify();
            self.notify_dependents();
        }
        Ok(action)
    }

    /// Run the composed transition function without touching the store:
    /// the `$reducer` surface observer plugins use for replay.
    pub(crate) fn reduce_pure(&self, state: &Value, action: &Action) -> Result<Value, StoreError> {
        (self.reduce)(state, action)
    }

    /// Invoke this store's own listeners. Callbacks run outside the
    /// listener lock so a listener may dispatch or resubscribe.
    fn notify(&self) {
        let listeners: Vec<Listener> = self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    /// One-hop propagation: each dependent's listeners fire directly; the
    /// dependent's own dispatch never runs.
    fn notify_dependents(&self) {
        let dependents: Vec<Weak<StoreInner>> = self.dependents.lock().clone();
        for dependent in dependents {
            if let Some(store) = dependent.upgrade() {
                store.notify();
            }
        }
    }

    pub(crate) fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Result<Subscription, StoreError> {
        if self.dispatching.load(Ordering::SeqCst) {
            return Err(StoreError::SubscribeDuringDispatch {
                model: self.model.name().to_string(),
            });
        }
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().insert(id, Arc::new(listener));
        Ok(Subscription {
            store: Arc::downgrade(self),
            id,
        })
    }

    /// Register `dependent` for one-hop notification and hand it this
    /// store's handle, keyed by model name.
    pub(crate) fn link_dependent(self: &Arc<Self>, dependent: &Arc<StoreInner>) {
        self.dependents.lock().push(Arc::downgrade(dependent));
        dependent
            .depends
            .write()
            .insert(self.model.name().to_string(), self.clone());
    }

    fn depend(&self, name: &str) -> Result<Arc<StoreInner>, StoreError> {
        self.depends
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownDependency {
                model: self.model.name().to_string(),
                name: name.to_string(),
            })
    }

    /// Release state, listeners, and dependency links. Operations after
    /// destroy are unsupported; a late async dispatch lands on cleared
    /// state with no listeners, which is harmless.
    pub(crate) fn destroy(&self) {
        tracing::debug!(model = self.model.name(), "destroying store");
        *self.state.write() = Value::Null;
        self.listeners.lock().clear();
        self.dependents.lock().clear();
        self.depends.write().clear();
        *self.snapshot.lock() = None;
    }
}

/// The public handle to one model's store.
///
/// Cheap to clone; every clone operates on the same underlying store.
#[derive(Clone)]
pub struct ModelStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("model", &self.inner.model().name())
            .finish_non_exhaustive()
    }
}

impl ModelStore {
    pub(crate) fn from_inner(inner: Arc<StoreInner>) -> Self {
        ModelStore { inner }
    }

    /// The model this store was built from.
    pub fn model(&self) -> &Model {
        self.inner.model()
    }

    /// Current state, with the manager's mode deciding snapshot semantics.
    pub fn state(&self) -> Value {
        self.inner.state_view()
    }

    /// Replace the whole state (`Replace` dispatch).
    pub fn set(&self, state: impl Into<Value>) -> Result<(), StoreError> {
        self.inner.dispatch(Action::replace(state)).map(drop)
    }

    /// Mutate the state through a copy-on-write draft (`Mutate` dispatch).
    pub fn modify(
        &self,
        modifier: impl Fn(&mut Draft) + Send + Sync + 'static,
    ) -> Result<(), StoreError> {
        self.inner.dispatch(Action::mutate(modifier)).map(drop)
    }

    /// Invoke a declared reducer by name. Unlike a raw [`dispatch`], the
    /// name is validated first.
    ///
    /// [`dispatch`]: ModelStore::dispatch
    pub fn reducer(&self, name: &str, payload: impl Into<Value>) -> Result<(), StoreError> {
        if self.inner.model().reducer_fn(name).is_none() {
            return Err(StoreError::UnknownReducer {
                model: self.inner.model().name().to_string(),
                name: name.to_string(),
            });
        }
        self.inner.dispatch(Action::named(name, payload)).map(drop)
    }

    /// Invoke a declared async action by name. The returned future yields
    /// whatever the action body returns.
    pub fn action(&self, name: &str, payload: impl Into<Value>) -> ActionFuture {
        let Some(action) = self.inner.model().action_fn(name).cloned() else {
            let err = StoreError::UnknownAction {
                model: self.inner.model().name().to_string(),
                name: name.to_string(),
            };
            return Box::pin(std::future::ready(Err(err)));
        };
        let ctx = ActionCtx::new(self.clone());
        action(ctx, payload.into())
    }

    /// Invoke a declared view by name. Views recompute on every call and
    /// never change state.
    pub fn view(&self, name: &str, args: impl Into<Value>) -> Result<Value, StoreError> {
        let Some(view) = self.inner.model().view_fn(name).cloned() else {
            return Err(StoreError::UnknownView {
                model: self.inner.model().name().to_string(),
                name: name.to_string(),
            });
        };
        let ctx = ViewCtx::new(self);
        Ok(view(&ctx, args.into()))
    }

    /// Run an action through the change pipeline.
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        self.inner.dispatch(action)
    }

    /// Register a change listener. Fails while a dispatch is in flight on
    /// this store.
    pub fn subscribe(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Result<Subscription, StoreError> {
        self.inner.subscribe(listener)
    }

    /// Handle to a declared dependency's store.
    pub(crate) fn dep(&self, name: &str) -> Result<ModelStore, StoreError> {
        Ok(ModelStore::from_inner(self.inner.depend(name)?))
    }
}

/// Registration handle returned by `subscribe`.
///
/// Unsubscribing is explicit and idempotent; dropping the handle leaves
/// the listener registered.
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    /// Remove the listener. Fails while a dispatch is in flight; calling
    /// again (or after the store is gone) is a no-op.
    pub fn unsubscribe(&self) -> Result<(), StoreError> {
        let Some(store) = self.store.upgrade() else {
            return Ok(());
        };
        if store.dispatching.load(Ordering::SeqCst) {
            return Err(StoreError::SubscribeDuringDispatch {
                model: store.model.name().to_string(),
            });
        }
        store.listeners.lock().remove(&self.id);
        Ok(())
    }
}
