use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Provider failure: {0}")]
    Provider(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// Returned by a collaborator that observed an external stop signal;
    /// the orchestrator surfaces it as the `Cancelled` terminal event.
    #[error("Cancelled")]
    Cancelled,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid vector: expected dimension {expected}, got {got}")]
    InvalidVector { expected: usize, got: usize },

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
