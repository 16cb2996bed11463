//! syncgate auth: signing key loading, tenant resolution and sync
//! token issuance.
//!
//! The pieces line up with the request flow: a [`TokenRequest`] is
//! resolved by [`TenantResolver`] into a
//! [`ResolutionResult`](syncgate_core::models::resolution::ResolutionResult),
//! which [`token::issue_sync_token`] signs with the process-wide
//! [`SigningKey`]. [`TokenService`] ties them together.

pub mod config;
pub mod error;
pub mod handler;
pub mod key;
pub mod resolver;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use handler::{HandlerResponse, RequestMode, TokenRequest, TokenResponse, status_for};
pub use key::{SigningKey, install_crypto_provider};
pub use resolver::TenantResolver;
pub use service::TokenService;
pub use token::SyncTokenClaims;
