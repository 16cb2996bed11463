//! syncgate database: SurrealDB connection management, a bounded
//! lookup pool and the organisation repository.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Bounded, timeout-aware access to the store ([`DbPool`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - [`repository::SurrealOrganisationRepository`], the
//!   `syncgate-core` store implementation

mod connection;
mod error;
mod pool;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use pool::{DbPool, PoolOptions, PooledConnection};
pub use schema::run_migrations;
