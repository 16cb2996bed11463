//! Repository trait definitions for data access abstraction.
//!
//! The issuance path only ever reads organisations, so the trait
//! exposes point lookups and nothing else. All operations are async.

use uuid::Uuid;

use crate::error::SyncgateResult;
use crate::models::organisation::Organisation;

// ---------------------------------------------------------------------------
// Organisation (global scope)
// ---------------------------------------------------------------------------

pub trait OrganisationRepository: Send + Sync {
    /// Read the `data_free_enabled` flag for an organisation by primary key.
    ///
    /// Fails with `NotFound` when no row exists and with `Deleted` when
    /// the organisation has been soft-deleted.
    fn get_data_free_enabled(&self, id: Uuid) -> impl Future<Output = SyncgateResult<bool>> + Send;

    /// Find the organisation whose PIN equals `pin` exactly.
    ///
    /// Soft-deleted rows are returned as-is; deciding what a deletion
    /// means is the caller's job.
    fn get_by_pin(&self, pin: &str) -> impl Future<Output = SyncgateResult<Organisation>> + Send;
}

impl<T: OrganisationRepository> OrganisationRepository for std::sync::Arc<T> {
    fn get_data_free_enabled(&self, id: Uuid) -> impl Future<Output = SyncgateResult<bool>> + Send {
        (**self).get_data_free_enabled(id)
    }

    fn get_by_pin(&self, pin: &str) -> impl Future<Output = SyncgateResult<Organisation>> + Send {
        (**self).get_by_pin(pin)
    }
}
