//! # Gemstock
//!
//! Jewelry product catalog service on PostgreSQL and the `may` coroutine runtime.
//!
//! Layers, leaf first:
//! - [`store`]: the `products` table and its CRUD primitives ([`ProductStore`])
//! - [`validation`]: shape rules applied before any write
//! - [`service`]: [`CatalogService`], the orchestration the transport calls into
//! - [`transport`]: the HTTP adapter on `may_minihttp`

pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod model;
pub mod service;
pub mod store;
pub mod transport;
pub mod validation;

pub use config::{CatalogConfig, StoreBackend};
pub use connection::{connect, ConnectionError};
pub use error::{CatalogError, StoreError};
pub use executor::{MayPostgresExecutor, SqlExecutor};
pub use model::{Product, ProductFields, ProductInput};
pub use service::{CatalogService, WriteOutcome};
pub use store::{MemoryProductStore, PgProductStore, ProductStore};
pub use transport::{serve, CatalogHttpService, Outcome};
