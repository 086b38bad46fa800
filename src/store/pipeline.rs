//! The change pipeline: model reducers composed into one deterministic
//! transition function per store.

use std::sync::Arc;

use crate::error::StoreError;
use crate::model::Model;
use crate::value::{Draft, Value};

/// A `Mutate` payload: freely mutates the draft, commits on return.
pub type Modifier = Arc<dyn Fn(&mut Draft) + Send + Sync>;

/// The composed transition function held by a store.
pub(crate) type ReduceFn =
    Arc<dyn Fn(&Value, &Action) -> Result<Value, StoreError> + Send + Sync>;

/// A dispatchable action.
#[derive(Clone)]
pub struct Action {
    kind: ActionKind,
}

#[derive(Clone)]
pub(crate) enum ActionKind {
    /// Returns state unchanged; dispatched once at store construction to
    /// seed the structural-sharing baseline.
    Init,
    /// The payload becomes the whole next state, verbatim.
    Replace(Value),
    /// The payload mutates a copy-on-write draft of the current state.
    Mutate(Modifier),
    /// A declared reducer, selected by name.
    Named { name: String, payload: Value },
}

impl Action {
    pub fn init() -> Action {
        Action {
            kind: ActionKind::Init,
        }
    }

    pub fn replace(state: impl Into<Value>) -> Action {
        Action {
            kind: ActionKind::Replace(state.into()),
        }
    }

    pub fn mutate(modifier: impl Fn(&mut Draft) + Send + Sync + 'static) -> Action {
        Action {
            kind: ActionKind::Mutate(Arc::new(modifier)),
        }
    }

    pub fn named(name: impl Into<String>, payload: impl Into<Value>) -> Action {
        Action {
            kind: ActionKind::Named {
                name: name.into(),
                payload: payload.into(),
            },
        }
    }

    /// The action's type tag, for diagnostics and observer plugins.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            ActionKind::Init => "@init",
            ActionKind::Replace(_) => "@replace",
            ActionKind::Mutate(_) => "@mutate",
            ActionKind::Named { name, .. } => name,
        }
    }

    pub(crate) fn kind(&self) -> &ActionKind {
        &self.kind
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("Action");
        dbg.field("type", &self.type_name());
        if let ActionKind::Named { payload, .. } = &self.kind {
            dbg.field("payload", payload);
        }
        dbg.finish()
    }
}

/// Compose a model's declared reducers with the built-in action kinds into
/// a single transition function.
///
/// The returned function computes the entire next state before the store
/// assigns anything, so a transition that fails leaves the current state
/// untouched.
pub(crate) fn compose(model: &Model) -> ReduceFn {
    let model = model.clone();
    Arc::new(move |state, action| {
        match action.kind() {
            ActionKind::Init => Ok(state.clone()),
            ActionKind::Replace(next) => Ok(next.clone()),
            ActionKind::Mutate(modifier) => {
                let mut draft = Draft::new(state.clone());
                modifier(&mut draft);
                Ok(draft.commit())
            }
            ActionKind::Named { name, payload } => match model.reducer_fn(name) {
                // Unknown action types fall through with state unchanged.
                None => Ok(state.clone()),
                Some(reducer) => {
                    let mut draft = Draft::new(state.clone());
                    match reducer(&mut draft, payload.clone()) {
                        Some(next) => Ok(next),
                        None => Ok(draft.commit()),
                    }
                }
            },
        }
    })
}
