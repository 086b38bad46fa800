//! Dependency-aware state containers with structural-sharing immutability.
//!
//! Declare named models — state shape, pure reducers, derived views, async
//! actions, and cross-model dependencies — and let a [`Manager`] wire them
//! into live, cached [`ModelStore`]s with subscription-based change
//! notification.
//!
//! # Architecture
//!
//! ```text
//! Model ──▶ Manager ──▶ Store ──▶ listeners
//!              │          │
//!   resolves deps     dispatch ──▶ pipeline ──▶ next state
//!   caches by name        │
//!                 one-hop notify ──▶ dependents' listeners
//! ```
//!
//! State is an immutable [`Value`] with `Arc`-shared subtrees. Transitions
//! run against a copy-on-write [`Draft`]; untouched subtrees keep their
//! identity, and a transition that changes nothing produces no
//! notification at all.
//!
//! # Example
//!
//! ```
//! use remodel::{Manager, Model, Value};
//!
//! let counter = Model::builder("counter")
//!     .state(Value::map([("value", 1)]))
//!     .reducer("add", |draft, payload| {
//!         let n = payload.as_i64().unwrap_or(1);
//!         draft.update_i64("value", |v| v + n);
//!     })
//!     .build();
//!
//! let manager = Manager::new();
//! let store = manager.get(&counter).unwrap();
//! store.reducer("add", 3).unwrap();
//! assert_eq!(store.state().get("value"), Some(&Value::Int(4)));
//! ```

pub mod error;
pub mod manager;
pub mod model;
pub mod store;
pub mod value;

pub use error::StoreError;
pub use manager::{Hook, Manager, ManagerOptions, Mode, PluginStore};
pub use model::{ActionFn, ActionFuture, DefinitionError, Model, ModelBuilder, ReducerFn, ViewFn};
pub use store::{Action, ActionCtx, ModelStore, Modifier, Subscription, ViewCtx};
pub use value::{Draft, Value};
