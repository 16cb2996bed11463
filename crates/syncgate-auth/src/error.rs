//! Authentication error types.

use syncgate_core::error::SyncgateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("organisation not found")]
    OrganisationNotFound,

    #[error("organisation was deleted")]
    OrganisationDeleted,

    #[error("failed to load signing key: {0}")]
    KeyLoad(String),

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),
}

impl From<AuthError> for SyncgateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(message) => SyncgateError::Validation { message },
            AuthError::OrganisationNotFound => SyncgateError::NotFound {
                entity: "organisation".into(),
                id: String::new(),
            },
            AuthError::OrganisationDeleted => SyncgateError::Deleted {
                entity: "organisation".into(),
                id: String::new(),
            },
            AuthError::KeyLoad(msg) => SyncgateError::KeyLoad(msg),
            AuthError::Signing(msg) => SyncgateError::Signing(msg),
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
                SyncgateError::Validation {
                    message: err.to_string(),
                }
            }
        }
    }
}
