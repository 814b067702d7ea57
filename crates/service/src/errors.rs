use thiserror::Error;

/// Failures raised by a storage backend. Surfaced to callers unchanged.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn backend(msg: impl Into<String>) -> Self { Self::Backend(msg.into()) }
}

/// Failure reported by the host's tab service.
#[derive(Debug, Error)]
#[error("tab query failed: {0}")]
pub struct TabQueryError(pub String);
