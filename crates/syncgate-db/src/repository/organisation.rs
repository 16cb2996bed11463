//! SurrealDB implementation of [`OrganisationRepository`].
//!
//! Every lookup checks a slot out of the [`DbPool`] first and holds it
//! until the query result has been read.

use chrono::{DateTime, Utc};
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use syncgate_core::error::{SyncgateError, SyncgateResult};
use syncgate_core::models::organisation::{CreateOrganisation, Organisation};
use syncgate_core::repository::OrganisationRepository;
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::DbPool;

/// Row struct for the feature-flag point lookup.
#[derive(Debug, SurrealValue)]
struct DataFreeRow {
    data_free_enabled: bool,
    deleted_at: Option<DateTime<Utc>>,
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct OrganisationRow {
    name: String,
    pin: String,
    deleted_at: Option<DateTime<Utc>>,
    data_free_enabled: bool,
}

impl OrganisationRow {
    fn into_organisation(self, id: Uuid) -> Organisation {
        Organisation {
            id,
            name: self.name,
            pin: self.pin,
            deleted_at: self.deleted_at,
            data_free_enabled: self.data_free_enabled,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct OrganisationRowWithId {
    record_id: String,
    name: String,
    pin: String,
    deleted_at: Option<DateTime<Utc>>,
    data_free_enabled: bool,
}

impl OrganisationRowWithId {
    fn try_into_organisation(self) -> Result<Organisation, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::InvalidRow(format!("invalid UUID: {e}")))?;
        Ok(Organisation {
            id,
            name: self.name,
            pin: self.pin,
            deleted_at: self.deleted_at,
            data_free_enabled: self.data_free_enabled,
        })
    }
}

/// SurrealDB implementation of the Organisation repository.
#[derive(Clone)]
pub struct SurrealOrganisationRepository<C: Connection> {
    pool: DbPool<C>,
}

impl<C: Connection> SurrealOrganisationRepository<C> {
    pub fn new(pool: DbPool<C>) -> Self {
        Self { pool }
    }

    /// Provision an organisation. Not part of the issuance path.
    pub async fn create(&self, input: CreateOrganisation) -> SyncgateResult<Organisation> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let conn = self.pool.acquire().await?;

        let result = conn
            .query(
                "CREATE type::record('organisation', $id) SET \
                 name = $name, pin = $pin, \
                 data_free_enabled = $data_free_enabled",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("pin", input.pin))
            .bind(("data_free_enabled", input.data_free_enabled))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OrganisationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organisation".into(),
            id: id_str,
        })?;

        Ok(row.into_organisation(id))
    }

    /// Mark an organisation as deleted. The row stays in place.
    pub async fn soft_delete(&self, id: Uuid) -> SyncgateResult<()> {
        let id_str = id.to_string();
        let conn = self.pool.acquire().await?;

        let result = conn
            .query(
                "UPDATE type::record('organisation', $id) SET \
                 deleted_at = time::now(), updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OrganisationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "organisation".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }
}

impl<C: Connection> OrganisationRepository for SurrealOrganisationRepository<C> {
    async fn get_data_free_enabled(&self, id: Uuid) -> SyncgateResult<bool> {
        let id_str = id.to_string();
        let conn = self.pool.acquire().await?;

        let mut result = conn
            .query("SELECT data_free_enabled, deleted_at FROM type::record('organisation', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DataFreeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organisation".into(),
            id: id_str.clone(),
        })?;

        if row.deleted_at.is_some() {
            return Err(SyncgateError::Deleted {
                entity: "organisation".into(),
                id: id_str,
            });
        }
        Ok(row.data_free_enabled)
    }

    async fn get_by_pin(&self, pin: &str) -> SyncgateResult<Organisation> {
        let pin_owned = pin.to_string();
        let conn = self.pool.acquire().await?;

        let mut result = conn
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM organisation WHERE pin = $pin LIMIT 1",
            )
            .bind(("pin", pin_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganisationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organisation".into(),
            // Never echo the PIN into errors.
            id: "pin".into(),
        })?;

        Ok(row.try_into_organisation()?)
    }
}
