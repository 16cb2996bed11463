//! Organisation (tenant) domain model.
//!
//! Organisations are created and mutated by the surrounding platform;
//! syncgate only reads them to decide whether and where a sync token
//! may be issued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length, in characters, of an organisation PIN.
pub const ORGANISATION_PIN_LEN: usize = 5;

/// A customer account scoping data and sync endpoint selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organisation {
    pub id: Uuid,
    /// Human-readable name, embedded in PIN-login tokens.
    pub name: String,
    /// Short shared login code. Compared by exact match only.
    pub pin: String,
    /// Soft-deletion marker. A deleted organisation is never eligible
    /// for token issuance.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Route sync traffic through the zero-rated endpoint.
    pub data_free_enabled: bool,
}

impl Organisation {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Fields required to provision an organisation.
///
/// Provisioning happens outside the issuance path; this type exists
/// for store setup and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganisation {
    pub name: String,
    pub pin: String,
    pub data_free_enabled: bool,
}
