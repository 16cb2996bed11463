//! Database-specific error types and conversions.

use syncgate_core::error::SyncgateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Statement failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Malformed row: {0}")]
    InvalidRow(String),

    #[error("no store connection available after {waited_ms} ms")]
    PoolTimeout { waited_ms: u64 },

    #[error("store connection pool is closed")]
    PoolClosed,
}

impl From<DbError> for SyncgateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SyncgateError::NotFound { entity, id },
            DbError::PoolTimeout { .. } | DbError::PoolClosed => {
                SyncgateError::Unavailable(err.to_string())
            }
            other => SyncgateError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_become_unavailable() {
        let err: SyncgateError = DbError::PoolTimeout { waited_ms: 50 }.into();
        assert!(matches!(err, SyncgateError::Unavailable(_)));

        let err: SyncgateError = DbError::PoolClosed.into();
        assert!(matches!(err, SyncgateError::Unavailable(_)));
    }

    #[test]
    fn not_found_keeps_entity_and_id() {
        let err: SyncgateError = DbError::NotFound {
            entity: "organisation".into(),
            id: "pin".into(),
        }
        .into();
        match err {
            SyncgateError::NotFound { entity, id } => {
                assert_eq!(entity, "organisation");
                assert_eq!(id, "pin");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
