//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables use SCHEMAFULL mode. UUIDs are record keys stored as strings.

use surrealdb::{Connection, Surreal};
use tracing::{debug, info};

use crate::error::DbError;

const TRACKING_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS schema_migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE schema_migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE schema_migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE schema_migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_schema_migration_version ON TABLE schema_migration \
    COLUMNS version UNIQUE;
";

/// One forward-only schema step.
struct Migration {
    version: u32,
    name: &'static str,
    ddl: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "organisations",
    ddl: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: organisations
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organisations (global scope)
-- =======================================================================
DEFINE TABLE organisation SCHEMAFULL;
DEFINE FIELD name ON TABLE organisation TYPE string;
DEFINE FIELD pin ON TABLE organisation TYPE string;
DEFINE FIELD deleted_at ON TABLE organisation TYPE option<datetime>;
DEFINE FIELD data_free_enabled ON TABLE organisation TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE organisation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organisation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organisation_pin ON TABLE organisation \
    COLUMNS pin UNIQUE;
";

/// Bring the schema up to date.
///
/// Idempotent: migrations at or below the highest recorded version are
/// skipped, so calling this on every startup is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(TRACKING_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("tracking table: {e}")))?;

    let applied = applied_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        debug!(version = applied, "Schema up to date");
        return Ok(());
    }

    for migration in pending {
        apply(db, migration).await?;
    }
    Ok(())
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut response = db
        .query("SELECT VALUE version FROM schema_migration ORDER BY version DESC LIMIT 1")
        .await?;
    let versions: Vec<u32> = response.take(0)?;
    Ok(versions.first().copied().unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(version = migration.version, name = migration.name, "Applying migration");

    db.query(migration.ddl)
        .await?
        .check()
        .map_err(|e| migration_error(migration, "ddl", e))?;

    db.query("CREATE schema_migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| migration_error(migration, "record", e))?;

    Ok(())
}

fn migration_error(migration: &Migration, stage: &str, e: impl std::fmt::Display) -> DbError {
    DbError::Migration(format!(
        "v{} {} ({stage}): {e}",
        migration.version, migration.name
    ))
}
