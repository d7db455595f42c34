//! Engine error types.

use phorm_core::validation::ValidationError;
use phorm_storage::StorageError;

/// Errors from dependency processing and administration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The persistence layer failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The dependency record itself is malformed.
    #[error("invalid dependency: {0}")]
    InvalidDependency(#[from] ValidationError),

    /// A dependency endpoint names a form that does not exist.
    #[error("unknown form: {id}")]
    UnknownForm {
        id: String,
    },

    /// A dependency endpoint names a field its form does not define.
    #[error("form {form_id} has no field {field_id}")]
    UnknownField {
        form_id: String,
        field_id: String,
    },

    /// Persisting the dependency would create a cycle in the field graph.
    #[error("adding this dependency would create a cycle")]
    CycleDetected,
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn unknown_form(id: impl Into<String>) -> Self {
        Self::UnknownForm { id: id.into() }
    }

    pub fn unknown_field(form_id: impl Into<String>, field_id: impl Into<String>) -> Self {
        Self::UnknownField {
            form_id: form_id.into(),
            field_id: field_id.into(),
        }
    }
}
