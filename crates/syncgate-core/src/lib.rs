//! syncgate core: domain models, the shared error taxonomy and the
//! store trait used by the resolver.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{SyncgateError, SyncgateResult};
