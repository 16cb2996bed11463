//! Bounded access to the store.
//!
//! A single SurrealDB client multiplexes queries, so the pool does not
//! own physical connections. It hands out a fixed number of slots
//! instead. Each lookup holds a [`PooledConnection`] for its lifetime and
//! the slot returns to the pool when the guard drops, on every exit
//! path. Callers that cannot get a slot within the acquire timeout fail
//! with [`DbError::PoolTimeout`] rather than waiting indefinitely.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use surrealdb::{Connection, Surreal};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

use crate::error::DbError;

/// Pool sizing and wait policy.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum number of concurrent outstanding lookups.
    pub max_connections: usize,
    /// How long a caller may wait for a free slot.
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 3,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Slot-limited handle to a SurrealDB client.
pub struct DbPool<C: Connection> {
    db: Surreal<C>,
    slots: Arc<Semaphore>,
    options: PoolOptions,
}

impl<C: Connection> Clone for DbPool<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            slots: Arc::clone(&self.slots),
            options: self.options.clone(),
        }
    }
}

impl<C: Connection> DbPool<C> {
    /// Wrap `db` in a pool. A `max_connections` of zero is raised to one.
    pub fn new(db: Surreal<C>, options: PoolOptions) -> Self {
        let max = options.max_connections.max(1);
        Self {
            db,
            slots: Arc::new(Semaphore::new(max)),
            options: PoolOptions {
                max_connections: max,
                ..options
            },
        }
    }

    /// Wait for a free slot, up to the configured acquire timeout.
    pub async fn acquire(&self) -> Result<PooledConnection<C>, DbError> {
        let waited_ms = whole_millis(self.options.acquire_timeout);
        let permit = tokio::time::timeout(
            self.options.acquire_timeout,
            Arc::clone(&self.slots).acquire_owned(),
        )
        .await
        .map_err(|_| {
            warn!(
                max_connections = self.options.max_connections,
                waited_ms, "Store pool exhausted"
            );
            DbError::PoolTimeout { waited_ms }
        })?
        .map_err(|_| DbError::PoolClosed)?;

        Ok(PooledConnection {
            db: self.db.clone(),
            _permit: permit,
        })
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Stop handing out slots. Pending and future `acquire` calls fail
    /// with [`DbError::PoolClosed`].
    pub fn close(&self) {
        self.slots.close();
    }
}

/// A checked-out pool slot. Dereferences to the SurrealDB client.
pub struct PooledConnection<C: Connection> {
    db: Surreal<C>,
    _permit: OwnedSemaphorePermit,
}

impl<C: Connection> Deref for PooledConnection<C> {
    type Target = Surreal<C>;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Saturates at `u64::MAX`.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
