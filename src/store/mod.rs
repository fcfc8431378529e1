//! Record store: durable CRUD primitives over the `products` table.
//!
//! [`ProductStore`] is the contract the catalog service is written against. Two
//! implementations ship with the crate:
//!
//! - [`PgProductStore`]: PostgreSQL through `may_postgres`, statements built with `sea-query`
//! - [`MemoryProductStore`]: an in-process table with the same id and uniqueness rules
//!
//! Update and delete report the number of rows changed instead of failing on a missing id;
//! `0` is the ordinary "no such product" answer.

mod memory;
mod params;
mod postgres;
mod schema;

pub use memory::MemoryProductStore;
pub use params::with_converted_params;
pub use postgres::PgProductStore;
pub use schema::{initialize_products_table, PRODUCTS_TABLE};

use crate::error::StoreError;
use crate::model::{Product, ProductFields};

/// Storage contract for products
pub trait ProductStore: Send + Sync {
    /// Create the backing table if it does not exist. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the store cannot be prepared.
    fn initialize(&self) -> Result<(), StoreError>;

    /// All products in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on a storage fault.
    fn list_all(&self) -> Result<Vec<Product>, StoreError>;

    /// The product with `id`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on a storage fault.
    fn get_by_id(&self, id: i64) -> Result<Option<Product>, StoreError>;

    /// Insert a product and return its new id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` when `sku` or a non-null `barcode` is taken.
    fn insert(&self, fields: &ProductFields) -> Result<i64, StoreError>;

    /// Replace every writable field of product `id`; returns rows changed (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` when the new `sku`/`barcode` belongs to another row.
    fn update(&self, id: i64, fields: &ProductFields) -> Result<u64, StoreError>;

    /// Remove product `id`; returns rows changed (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on a storage fault.
    fn delete(&self, id: i64) -> Result<u64, StoreError>;

    /// `true` when the store can serve requests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the probe itself cannot run.
    fn check_health(&self) -> Result<bool, StoreError>;

    /// Release resources. The store must not be used afterwards.
    fn shutdown(&self) {}
}
