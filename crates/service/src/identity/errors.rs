use thiserror::Error;

use crate::errors::{StorageError, TabQueryError};

/// Business errors for identity state operations
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("record error: {0}")]
    Serialization(String),
    #[error(transparent)]
    TabQuery(#[from] TabQueryError),
}

impl From<models::errors::ModelError> for IdentityError {
    fn from(e: models::errors::ModelError) -> Self { Self::Serialization(e.to_string()) }
}

impl IdentityError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            IdentityError::InvalidArgument(_) => 1001,
            IdentityError::Serialization(_) => 1101,
            IdentityError::TabQuery(_) => 1102,
            IdentityError::Storage(_) => 1200,
        }
    }
}
