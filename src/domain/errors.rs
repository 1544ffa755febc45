use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures inside a dispatch cycle. Each is caught at the recipient or
/// message boundary and turned into a result entry.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    Resolution(String),
    #[error("{0}")]
    Transport(String),
    #[error("persistence error: {0}")]
    Persistence(#[source] anyhow::Error),
}
