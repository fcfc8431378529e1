//! In-process product store.
//!
//! Keeps the same observable rules as the PostgreSQL table: ids come from a counter that
//! never goes backwards, `sku` is unique, `barcode` is unique when present, and `updated_at`
//! strictly increases on every update. One mutex guards the whole table, so each operation
//! is atomic with respect to every other.

use super::ProductStore;
use crate::error::StoreError;
use crate::model::{Product, ProductFields};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Product>,
    closed: bool,
}

impl Table {
    /// Reject `fields` if its `sku` or `barcode` is held by a row other than `except`.
    fn check_unique(&self, fields: &ProductFields, except: Option<i64>) -> Result<(), StoreError> {
        for row in self.rows.values().filter(|row| Some(row.id) != except) {
            if row.fields.sku == fields.sku {
                return Err(StoreError::Constraint {
                    constraint: "products_sku_key".to_string(),
                    message: format!("Key (sku)=({}) already exists.", fields.sku),
                });
            }
            if let (Some(existing), Some(barcode)) = (&row.fields.barcode, &fields.barcode) {
                if existing == barcode {
                    return Err(StoreError::Constraint {
                        constraint: "products_barcode_key".to_string(),
                        message: format!("Key (barcode)=({barcode}) already exists."),
                    });
                }
            }
        }
        Ok(())
    }
}

/// `ProductStore` held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    table: Mutex<Table>,
}

impl MemoryProductStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` once the store is shut down.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.rows.len())
    }

    /// `true` when no rows are stored
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` once the store is shut down.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table>, StoreError> {
        let table = self
            .table
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        if table.closed {
            return Err(StoreError::Unavailable("memory store is shut down".to_string()));
        }
        Ok(table)
    }
}

/// Next `updated_at` for a row last touched at `previous`.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl ProductStore for MemoryProductStore {
    fn initialize(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    fn insert(&self, fields: &ProductFields) -> Result<i64, StoreError> {
        let mut table = self.lock()?;
        table.check_unique(fields, None)?;

        table.last_id += 1;
        let id = table.last_id;
        let now = Utc::now();
        table.rows.insert(
            id,
            Product {
                id,
                fields: fields.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    fn update(&self, id: i64, fields: &ProductFields) -> Result<u64, StoreError> {
        let mut table = self.lock()?;
        if !table.rows.contains_key(&id) {
            return Ok(0);
        }
        table.check_unique(fields, Some(id))?;

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(0);
        };
        row.fields = fields.clone();
        row.updated_at = next_timestamp(row.updated_at);
        Ok(1)
    }

    fn delete(&self, id: i64) -> Result<u64, StoreError> {
        Ok(u64::from(self.lock()?.rows.remove(&id).is_some()))
    }

    fn check_health(&self) -> Result<bool, StoreError> {
        Ok(self.lock().is_ok())
    }

    fn shutdown(&self) {
        if let Ok(mut table) = self.table.lock() {
            table.rows.clear();
            table.closed = true;
        }
    }
}
