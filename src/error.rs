//! Error types for the record store and the catalog service.
//!
//! Two layers:
//! - [`StoreError`] is what a [`ProductStore`](crate::store::ProductStore) returns. It keeps
//!   uniqueness violations apart from every other storage fault.
//! - [`CatalogError`] is what the [`CatalogService`](crate::service::CatalogService) returns.
//!   It adds caller input failures and turns constraint violations into conflicts.
//!
//! "Not found" is not an error at either layer; it travels as `Option::None` or
//! [`WriteOutcome::NotFound`](crate::service::WriteOutcome::NotFound).

use crate::connection::ConnectionError;
use may_postgres::error::SqlState;
use may_postgres::Error as PostgresError;
use std::fmt;

/// Record store error type
#[derive(Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write (`sku`, or a non-null `barcode`)
    Constraint {
        /// Name of the violated constraint or column
        constraint: String,
        /// Driver or store message
        message: String,
    },
    /// `PostgreSQL` error from `may_postgres`
    Postgres(PostgresError),
    /// Statement could not be built or bound
    Query(String),
    /// A row could not be decoded into a product
    Decode(String),
    /// The store is closed, poisoned, or otherwise unusable
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` when the error is a uniqueness violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::Constraint { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Constraint { constraint, message } => {
                write!(f, "Constraint violation on {constraint}: {message}")
            }
            StoreError::Postgres(e) => write!(f, "PostgreSQL error: {e}"),
            StoreError::Query(s) => write!(f, "Query error: {s}"),
            StoreError::Decode(s) => write!(f, "Decode error: {s}"),
            StoreError::Unavailable(s) => write!(f, "Store unavailable: {s}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Postgres(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            let constraint = err
                .as_db_error()
                .and_then(|db| db.constraint())
                .unwrap_or("unique")
                .to_string();
            return StoreError::Constraint {
                constraint,
                message: err.to_string(),
            };
        }
        StoreError::Postgres(err)
    }
}

impl From<ConnectionError> for StoreError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::PostgresError(e) => StoreError::Postgres(e),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Catalog service error type
#[derive(Debug)]
pub enum CatalogError {
    /// Caller-supplied data failed a shape rule
    InvalidInput(String),
    /// A write collided with an existing `sku` or `barcode`
    Conflict(String),
    /// The record store failed
    Storage(StoreError),
}

impl CatalogError {
    /// Builds the `InvalidInput` error for a set of missing required fields.
    pub fn missing_fields(fields: &[&str]) -> Self {
        CatalogError::InvalidInput(format!("missing required field(s): {}", fields.join(", ")))
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::InvalidInput(s) => write!(f, "Invalid input: {s}"),
            CatalogError::Conflict(s) => write!(f, "Conflict: {s}"),
            CatalogError::Storage(e) => write!(f, "Storage error: {e}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint { constraint, .. } => CatalogError::Conflict(format!(
                "a product with the same {} already exists",
                constraint_field(&constraint)
            )),
            other => CatalogError::Storage(other),
        }
    }
}

/// Maps a constraint name (`products_sku_key`) to the column a caller knows (`sku`).
fn constraint_field(constraint: &str) -> &str {
    if constraint.contains("barcode") {
        "barcode"
    } else if constraint.contains("sku") {
        "sku"
    } else {
        constraint
    }
}
