//! Declarative model definitions.
//!
//! A [`Model`] is a passive record: a name, an initial state, and tables of
//! reducers (pure transitions), actions (async operations), and views
//! (derived computations), plus the list of models it depends on. Models do
//! nothing on their own; a [`Manager`](crate::manager::Manager) turns them
//! into live stores.
//!
//! Every registered function takes its execution context as an explicit
//! argument: reducers receive the [`Draft`], actions an
//! [`ActionCtx`](crate::store::ActionCtx), views a
//! [`ViewCtx`](crate::store::ViewCtx).

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::error::StoreError;
use crate::store::{ActionCtx, ViewCtx};
use crate::value::{Draft, Value};

/// Boxed future returned by action bodies.
pub type ActionFuture = Pin<Box<dyn Future<Output = Result<Value, StoreError>> + Send>>;

/// A state transition: mutate the draft and return `None`, or return
/// `Some(state)` to replace the result wholesale.
pub type ReducerFn = Arc<dyn Fn(&mut Draft, Value) -> Option<Value> + Send + Sync>;

/// An async operation bound to a store's execution context.
pub type ActionFn = Arc<dyn Fn(ActionCtx, Value) -> ActionFuture + Send + Sync>;

/// A pure derived computation over state and explicit arguments.
pub type ViewFn = Arc<dyn Fn(&ViewCtx, Value) -> Value + Send + Sync>;

/// Errors in a model definition, surfaced when the model is instantiated.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Model name must not be empty")]
    EmptyModelName,

    #[error("Model '{model}' declares '{name}' more than once across reducers/actions/views")]
    DuplicateMember { model: String, name: String },
}

struct ModelInner {
    name: String,
    state: Value,
    reducers: BTreeMap<String, ReducerFn>,
    actions: BTreeMap<String, ActionFn>,
    views: BTreeMap<String, ViewFn>,
    depends: Vec<Model>,
}

/// An immutable model definition. Cloning shares the definition.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Start building a model with the given name.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            state: Value::Null,
            reducers: BTreeMap::new(),
            actions: BTreeMap::new(),
            views: BTreeMap::new(),
            depends: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The declared initial state.
    pub fn initial_state(&self) -> &Value {
        &self.inner.state
    }

    /// Declared dependencies, in declaration order. Order carries no
    /// semantic weight; resolution is idempotent.
    pub fn depends(&self) -> &[Model] {
        &self.inner.depends
    }

    pub(crate) fn reducer_fn(&self, name: &str) -> Option<&ReducerFn> {
        self.inner.reducers.get(name)
    }

    pub(crate) fn action_fn(&self, name: &str) -> Option<&ActionFn> {
        self.inner.actions.get(name)
    }

    pub(crate) fn view_fn(&self, name: &str) -> Option<&ViewFn> {
        self.inner.views.get(name)
    }

    /// Cheap name check, applied in every mode: a model without a name
    /// cannot be cached or depended upon.
    pub(crate) fn require_name(&self) -> Result<(), DefinitionError> {
        if self.inner.name.is_empty() {
            return Err(DefinitionError::EmptyModelName);
        }
        Ok(())
    }

    /// Strict-mode validation: member names must be unique across the
    /// reducer, action, and view tables.
    pub(crate) fn validate(&self) -> Result<(), DefinitionError> {
        self.require_name()?;
        for name in self.inner.actions.keys() {
            if self.inner.reducers.contains_key(name) {
                return Err(self.duplicate(name));
            }
        }
        for name in self.inner.views.keys() {
            if self.inner.reducers.contains_key(name) || self.inner.actions.contains_key(name) {
                return Err(self.duplicate(name));
            }
        }
        Ok(())
    }

    fn duplicate(&self, name: &str) -> DefinitionError {
        DefinitionError::DuplicateMember {
            model: self.inner.name.clone(),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("state", &self.inner.state)
            .field("reducers", &self.inner.reducers.keys())
            .field("actions", &self.inner.actions.keys())
            .field("views", &self.inner.views.keys())
            .field(
                "depends",
                &self
                    .inner
                    .depends
                    .iter()
                    .map(Model::name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Fluent construction for [`Model`].
pub struct ModelBuilder {
    name: String,
    state: Value,
    reducers: BTreeMap<String, ReducerFn>,
    actions: BTreeMap<String, ActionFn>,
    views: BTreeMap<String, ViewFn>,
    depends: Vec<Model>,
}

impl ModelBuilder {
    /// Set the initial state.
    pub fn state(mut self, state: impl Into<Value>) -> Self {
        self.state = state.into();
        self
    }

    /// Register a draft-mutating reducer.
    pub fn reducer(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut Draft, Value) + Send + Sync + 'static,
    ) -> Self {
        self.reducers.insert(
            name.into(),
            Arc::new(move |draft, payload| {
                f(draft, payload);
                None
            }),
        );
        self
    }

    /// Register a reducer that returns the whole next state instead of
    /// mutating the draft.
    pub fn pure_reducer(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Value, Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.reducers.insert(
            name.into(),
            Arc::new(move |draft, payload| Some(f(draft.value(), payload))),
        );
        self
    }

    /// Register an async action. The body may await freely and call
    /// sibling reducers/actions/views or dependency stores through its
    /// context.
    pub fn action<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ActionCtx, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, StoreError>> + Send + 'static,
    {
        self.actions.insert(
            name.into(),
            Arc::new(move |ctx, payload| Box::pin(f(ctx, payload)) as ActionFuture),
        );
        self
    }

    /// Register a derived view. Views read state, never mutate it.
    pub fn view(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&ViewCtx, Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.views.insert(name.into(), Arc::new(f));
        self
    }

    /// Declare a dependency on another model.
    pub fn depend(mut self, model: &Model) -> Self {
        self.depends.push(model.clone());
        self
    }

    pub fn build(self) -> Model {
        Model {
            inner: Arc::new(ModelInner {
                name: self.name,
                state: self.state,
                reducers: self.reducers,
                actions: self.actions,
                views: self.views,
                depends: self.depends,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_tables_and_depends() {
        let dep = Model::builder("dep").state(Value::map([("v", 0)])).build();
        let model = Model::builder("demo")
            .state(Value::map([("value", 1)]))
            .reducer("bump", |draft, _| draft.update_i64("value", |n| n + 1))
            .view("value", |ctx, _| {
                ctx.state().get("value").cloned().unwrap_or(Value::Null)
            })
            .depend(&dep)
            .build();

        assert_eq!(model.name(), "demo");
        assert!(model.reducer_fn("bump").is_some());
        assert!(model.view_fn("value").is_some());
        assert_eq!(model.depends().len(), 1);
        assert_eq!(model.depends()[0].name(), "dep");
        assert!(model.validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let model = Model::builder("").build();
        assert!(matches!(
            model.require_name(),
            Err(DefinitionError::EmptyModelName)
        ));
    }

    #[test]
    fn duplicate_member_across_tables_is_rejected() {
        let model = Model::builder("demo")
            .reducer("tick", |_, _| {})
            .view("tick", |_, _| Value::Null)
            .build();
        assert!(matches!(
            model.validate(),
            Err(DefinitionError::DuplicateMember { .. })
        ));
    }
}
