//! Adapter error types.

use thiserror::Error;

/// Errors raised while loading or running a cross-validation case.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The case document is not valid JSON.
    #[error("invalid case document: {0}")]
    Json(#[from] serde_json::Error),

    /// A mandatory term is missing from the `terms` map.
    #[error("missing term: {0}")]
    MissingTerm(&'static str),

    /// A term value could not be interpreted.
    #[error("invalid term {name}: {reason}")]
    InvalidTerm {
        /// The camelCase term name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An engine failure while simulating the case.
    #[error(transparent)]
    Engine(#[from] actus_core::types::error::EngineError),

    /// An observer construction failure.
    #[error(transparent)]
    Observer(#[from] actus_core::types::error::ObserverError),
}
