use crate::validate::ValidationFailure;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource not resolved: {0} has no identifier in the state snapshot")]
    Unresolved(String),

    #[error("Dangling reference: {from} references undeclared {to}")]
    DanglingReference { from: String, to: String },

    #[error("Dependency cycle involving: {0}")]
    DependencyCycle(String),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
