use thiserror::Error;

use crate::model::DefinitionError;

/// Errors raised by stores and the manager.
///
/// All of these are programmer/usage errors detected synchronously at the
/// point of misuse. None are retried or downgraded to a no-op; the
/// structural-sharing and notification invariants depend on the
/// preconditions they guard.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("Dispatched action has an empty type on model '{model}'")]
    MissingActionType { model: String },

    #[error("Model '{model}' may not dispatch while a dispatch is already in progress")]
    DispatchInProgress { model: String },

    #[error("Model '{model}' may not change subscriptions while a dispatch is in progress")]
    SubscribeDuringDispatch { model: String },

    #[error("Model '{model}' has no reducer named '{name}'")]
    UnknownReducer { model: String, name: String },

    #[error("Model '{model}' has no action named '{name}'")]
    UnknownAction { model: String, name: String },

    #[error("Model '{model}' has no view named '{name}'")]
    UnknownView { model: String, name: String },

    #[error("Model '{model}' does not declare a dependency named '{name}'")]
    UnknownDependency { model: String, name: String },

    #[error("Dependency cycle detected: {}", path.join(" -> "))]
    DependencyCycle { path: Vec<String> },
}
