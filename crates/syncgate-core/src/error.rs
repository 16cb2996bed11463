//! Error types for syncgate.
//!
//! Every layer converts its local error into [`SyncgateError`] so the
//! request handler can map outcomes to responses in one place.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncgateError {
    /// Malformed input. Raised before any store access.
    #[error("{message}")]
    Validation { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// The entity exists but has been soft-deleted. Callers outside the
    /// core must not be able to tell this apart from [`Self::NotFound`].
    #[error("Entity deleted: {entity} with id {id}")]
    Deleted { entity: String, id: String },

    /// The store could not serve the request in time (pool exhausted or
    /// backend unreachable).
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Key load error: {0}")]
    KeyLoad(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncgateError {
    /// Shorthand for a [`SyncgateError::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for errors that must be reported to callers as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Deleted { .. })
    }
}

pub type SyncgateResult<T> = Result<T, SyncgateError>;
