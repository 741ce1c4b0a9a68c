//! # Rule Store Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / MigrateError      CoreError (payload or row invalid)    │
//! │       │                                │                                │
//! │       └───────────────┬────────────────┘                                │
//! │                       ▼                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (promo-api) ← Mapped to an HTTP status                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use promo_core::{CoreError, ValidationError};
use thiserror::Error;

/// Rule store errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// SQLite rejected a row (`CHECK` / `NOT NULL`), e.g. a PRODUCT row
    /// without SKU written past validation.
    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    /// A write was rejected before reaching SQL.
    ///
    /// ## When This Occurs
    /// - PRODUCT rule without SKU
    /// - AMOUNT rule with a missing or inverted range
    /// - Negative percentage
    #[error("Invalid discount: {0}")]
    Validation(#[from] ValidationError),

    /// A stored row cannot be decoded into a rule.
    ///
    /// ## When This Occurs
    /// - Decimal column holds text that is not a number
    /// - Unknown kind string written by another tool
    /// - PRODUCT row with a NULL sku
    #[error("Corrupt discount record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a CorruptRecord error.
    pub fn corrupt(id: i64, reason: impl ToString) -> Self {
        DbError::CorruptRecord {
            id,
            reason: reason.to_string(),
        }
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(v) => DbError::Validation(v),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → ConstraintViolation or QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Discount", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "CHECK constraint failed: ..." / "NOT NULL constraint failed: ..."
                if msg.contains("constraint failed") {
                    DbError::ConstraintViolation(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_becomes_validation() {
        let core = CoreError::InvalidInput(ValidationError::Required {
            field: "sku".to_string(),
        });
        let err: DbError = core.into();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(err.to_string(), "Invalid discount: sku is required");
    }

    #[tokio::test]
    async fn test_check_constraint_maps_to_constraint_violation() {
        let db = crate::Database::new(crate::DbConfig::in_memory())
            .await
            .unwrap();

        let err = sqlx::query(
            "INSERT INTO discounts (kind, percentage, created_at) VALUES ('PRODUCT', '5', '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap_err();

        assert!(matches!(DbError::from(err), DbError::ConstraintViolation(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
