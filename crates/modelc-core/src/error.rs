//! Core error types.

use crate::model::EntityKind;
use thiserror::Error;

/// Internal faults raised while building or enhancing an entity graph.
///
/// Domain-level problems such as unresolved names never surface here; they
/// are recorded as [`ValidationFailure`](crate::ValidationFailure)s instead.
#[derive(Debug, Error)]
pub enum Error {
    /// An entity with the same kind and name already exists in the namespace.
    #[error("duplicate {kind} '{name}' in namespace '{namespace}'")]
    DuplicateEntity {
        /// Kind of the rejected entity.
        kind: EntityKind,
        /// Name of the rejected entity.
        name: String,
        /// Namespace that already holds the name.
        namespace: String,
    },

    /// A namespace names a dependency that does not exist.
    #[error("namespace '{namespace}' depends on unknown namespace '{dependency}'")]
    UnknownNamespace {
        /// Namespace declaring the dependency.
        namespace: String,
        /// Missing dependency name.
        dependency: String,
    },

    /// Namespace dependencies form a cycle.
    #[error("namespace dependency cycle through '{0}'")]
    DependencyCycle(String),

    /// An enhancer hit a fault validation should already have caught.
    #[error("enhancer {enhancer} failed: {message}")]
    Enhancer {
        /// Name of the failing enhancer.
        enhancer: String,
        /// Description of the fault.
        message: String,
    },

    /// Malformed model document.
    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),

    /// I/O error while reading a model document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an enhancer fault.
    pub fn enhancer(enhancer: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Enhancer {
            enhancer: enhancer.into(),
            message: message.into(),
        }
    }
}
