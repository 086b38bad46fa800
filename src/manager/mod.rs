//! The registry: constructs, caches, and tears down stores.
//!
//! One manager owns one application scope. It caches exactly one store per
//! model name, resolves declared dependencies depth-first before a
//! dependent store is constructed (registering the one-hop back-links as
//! it goes), seeds initial state, and drives the lifecycle observer hooks.

mod plugin;

pub use plugin::{Hook, PluginStore};

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::StoreError;
use crate::model::Model;
use crate::store::{ModelStore, StoreInner, Subscription};
use crate::value::Value;

/// Validation strictness, fixed at manager construction.
///
/// Strict mode validates definitions eagerly and hands out detached state
/// snapshots; relaxed mode skips both for performance. The correctness
/// guards (empty names, reentrancy, cycles, unknown-name lookups) hold in
/// either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Strict,
    #[default]
    Relaxed,
}

/// Configuration for [`Manager::with_options`].
pub struct ManagerOptions {
    /// Per-model starting state, consumed once at each model's first
    /// construction. Entries for names never constructed are discarded on
    /// destroy.
    pub initial_state: BTreeMap<String, Value>,
    /// Lifecycle observers, invoked in registration order.
    pub plugins: Vec<Box<dyn Hook>>,
    pub mode: Mode,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        ManagerOptions {
            initial_state: BTreeMap::new(),
            plugins: Vec::new(),
            mode: Mode::default(),
        }
    }
}

struct ManagerInner {
    stores: RwLock<BTreeMap<String, Arc<StoreInner>>>,
    initial_state: Mutex<BTreeMap<String, Value>>,
    hooks: Vec<Box<dyn Hook>>,
    mode: Mode,
    /// Names currently being constructed, outermost first. A name showing
    /// up twice means the dependency graph is not a DAG.
    resolving: Mutex<Vec<String>>,
}

/// The per-application store registry. Cheap to clone; clones share the
/// same cache.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<ManagerInner>,
}

impl Manager {
    /// A manager with relaxed defaults and no plugins.
    pub fn new() -> Manager {
        Manager::with_options(ManagerOptions::default())
    }

    pub fn with_options(options: ManagerOptions) -> Manager {
        let manager = Manager {
            inner: Arc::new(ManagerInner {
                stores: RwLock::new(BTreeMap::new()),
                initial_state: Mutex::new(BTreeMap::new()),
                hooks: options.plugins,
                mode: options.mode,
                resolving: Mutex::new(Vec::new()),
            }),
        };
        // Hooks may seed or rewrite the table before any store consumes it.
        let mut initial_state = options.initial_state;
        for hook in &manager.inner.hooks {
            hook.on_init(&manager, &mut initial_state);
        }
        *manager.inner.initial_state.lock() = initial_state;
        manager
    }

    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    /// Return the store for `model`, constructing it (and its dependencies,
    /// depth-first) on first request.
    ///
    /// The cache is keyed purely by name: two models sharing a name yield
    /// the same store, and the first-constructed definition wins.
    pub fn get(&self, model: &Model) -> Result<ModelStore, StoreError> {
        Ok(ModelStore::from_inner(self.resolve(model)?))
    }

    /// Convenience pass-through to the resolved store's `subscribe`.
    pub fn subscribe(
        &self,
        model: &Model,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Result<Subscription, StoreError> {
        self.resolve(model)?.subscribe(listener)
    }

    /// Current state of every store constructed so far.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.inner
            .stores
            .read()
            .iter()
            .map(|(name, store)| (name.clone(), store.state_view()))
            .collect()
    }

    /// Tear down the whole scope: run `on_destroy` hooks, destroy every
    /// cached store, and drop unconsumed initial state.
    pub fn destroy(&self) {
        for hook in &self.inner.hooks {
            hook.on_destroy();
        }
        let stores = std::mem::take(&mut *self.inner.stores.write());
        for store in stores.values() {
            store.destroy();
        }
        self.inner.initial_state.lock().clear();
        tracing::debug!(count = stores.len(), "manager destroyed");
    }

    fn resolve(&self, model: &Model) -> Result<Arc<StoreInner>, StoreError> {
        model.require_name()?;
        if self.inner.mode == Mode::Strict {
            model.validate()?;
        }
        if let Some(existing) = self.inner.stores.read().get(model.name()) {
            return Ok(existing.clone());
        }
        {
            let mut resolving = self.inner.resolving.lock();
            if resolving.iter().any(|name| name == model.name()) {
                let mut path = resolving.clone();
                path.push(model.name().to_string());
                tracing::debug!(path = ?path, "dependency cycle rejected");
                return Err(StoreError::DependencyCycle { path });
            }
            resolving.push(model.name().to_string());
        }
        let popped = scopeguard::guard(self.inner.clone(), |inner| {
            inner.resolving.lock().pop();
        });
        let store = self.construct(model);
        drop(popped);
        store
    }

    /// Construction order matches the lifecycle contract: `on_model`, then
    /// dependencies, then the store itself (which runs its one `Init`
    /// dispatch), then back-link wiring, then `on_store_created`, then the
    /// cache insert.
    fn construct(&self, model: &Model) -> Result<Arc<StoreInner>, StoreError> {
        for hook in &self.inner.hooks {
            hook.on_model(model);
        }
        let mut depends = Vec::with_capacity(model.depends().len());
        for dependency in model.depends() {
            depends.push(self.resolve(dependency)?);
        }
        let initial = self.inner.initial_state.lock().remove(model.name());
        let store = Arc::new(StoreInner::new(model.clone(), initial, self.inner.mode)?);
        for dependency in &depends {
            dependency.link_dependent(&store);
        }
        let restricted = PluginStore::new(store.clone());
        for hook in &self.inner.hooks {
            hook.on_store_created(&restricted);
        }
        self.inner
            .stores
            .write()
            .insert(model.name().to_string(), store.clone());
        tracing::debug!(model = model.name(), "store constructed");
        Ok(store)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Manager::new()
    }
}
