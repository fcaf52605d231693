use cirrus_core::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Missing dependency: {resource} needs {dependency} realized first")]
    MissingDependency {
        resource: String,
        dependency: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
