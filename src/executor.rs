//! SQL execution over `may_postgres`.
//!
//! [`SqlExecutor`] is the seam between the PostgreSQL product store and the driver. The store
//! only ever talks to this trait, which lets the unit tests swap in a capturing executor and
//! check the generated SQL without a database.

use crate::connection::{self, ConnectionError};
use crate::error::StoreError;
use may::sync::Mutex;
use may_postgres::types::ToSql;
use may_postgres::{Client, Row};
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Trait for executing SQL statements
pub trait SqlExecutor: Send + Sync {
    /// Execute a statement and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` for unique violations, `StoreError::Postgres` otherwise.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError>;

    /// Execute a query that must return exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or does not return exactly one row.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError>;

    /// Execute a query and return every row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError>;

    /// Probe the connection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the probe cannot run at all.
    fn check_health(&self) -> Result<bool, StoreError>;
}

/// `SqlExecutor` backed by a single `may_postgres::Client`.
///
/// Statements from concurrent requests take turns on the connection; waiting parks the
/// calling coroutine rather than the worker thread.
pub struct MayPostgresExecutor {
    client: Mutex<Client>,
}

impl MayPostgresExecutor {
    /// Create a new executor from a `may_postgres::Client`
    pub fn new(client: Client) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }

    /// Validate `url`, connect, and wrap the client.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` when the string is malformed or the server is unreachable.
    pub fn connect(url: &str) -> Result<Self, ConnectionError> {
        connection::connect(url).map(Self::new)
    }

    fn with_client<T>(
        &self,
        run: impl FnOnce(&Client) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let client = self
            .client
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
        run(&client)
    }

    fn observe<T>(
        &self,
        query: &str,
        run: impl FnOnce(&Client) -> Result<T, may_postgres::Error>,
    ) -> Result<T, StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::query_span(statement_kind(query)).entered();

        let start = Instant::now();
        let result = self.with_client(|client| run(client).map_err(StoreError::from));
        let elapsed = start.elapsed();

        #[cfg(feature = "metrics")]
        {
            METRICS.record_query(statement_kind(query), elapsed);
            if result.is_err() {
                METRICS.record_store_error(statement_kind(query));
            }
        }

        if let Err(e) = &result {
            if e.is_constraint_violation() {
                log::debug!("{} rejected by constraint: {e}", statement_kind(query));
            } else {
                log::warn!("{} failed after {elapsed:?}: {e}", statement_kind(query));
            }
        }

        result
    }
}

impl SqlExecutor for MayPostgresExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        self.observe(query, |client| client.execute(query, params))
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        self.observe(query, |client| client.query_one(query, params))
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError> {
        self.observe(query, |client| client.query(query, params))
    }

    fn check_health(&self) -> Result<bool, StoreError> {
        self.with_client(|client| {
            connection::check_connection_health(client).map_err(StoreError::from)
        })
    }
}

/// First keyword of a statement, lower-cased (`select`, `insert`, ...), for logs and metrics.
pub(crate) fn statement_kind(query: &str) -> &'static str {
    let keyword = query
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match keyword.as_str() {
        "select" => "select",
        "insert" => "insert",
        "update" => "update",
        "delete" => "delete",
        "create" => "create",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_kind() {
        assert_eq!(statement_kind("SELECT * FROM products"), "select");
        assert_eq!(statement_kind("  insert into products"), "insert");
        assert_eq!(statement_kind("UPDATE products SET"), "update");
        assert_eq!(statement_kind("DELETE FROM products"), "delete");
        assert_eq!(statement_kind("CREATE TABLE IF NOT EXISTS products"), "create");
        assert_eq!(statement_kind("VACUUM"), "other");
        assert_eq!(statement_kind(""), "other");
    }
}
