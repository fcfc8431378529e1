//! Catalog service: validation in front of the record store.
//!
//! Every operation resolves to one of three shapes:
//! - success, with a payload where the operation has one
//! - not found (`None` / [`WriteOutcome::NotFound`]), which is an expected answer, not an error
//! - [`CatalogError`]: invalid input, conflict, or a storage failure passed through unchanged
//!
//! The service keeps no state of its own beyond the store handle.

use crate::error::CatalogError;
use crate::model::{Product, ProductInput};
use crate::store::ProductStore;
use crate::validation::validate_product;

/// Result of an update or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row existed and the change is committed
    Applied,
    /// No row has that id; nothing changed
    NotFound,
}

impl WriteOutcome {
    fn from_rows_changed(rows: u64) -> Self {
        if rows == 0 {
            WriteOutcome::NotFound
        } else {
            WriteOutcome::Applied
        }
    }
}

/// Product catalog operations over a [`ProductStore`]
pub struct CatalogService<S: ProductStore> {
    store: S,
}

impl<S: ProductStore> CatalogService<S> {
    /// Build a service around an initialized store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The store this service writes to
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every product, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on a store fault.
    pub fn list(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list_all()?)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on a store fault.
    pub fn get(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let product = self.store.get_by_id(id)?;
        if product.is_none() {
            log::debug!("product {id} not found");
        }
        Ok(product)
    }

    /// Validate and insert a product, returning its new id.
    ///
    /// # Errors
    ///
    /// - `CatalogError::InvalidInput` when validation fails; the store is not touched
    /// - `CatalogError::Conflict` when `sku` or `barcode` is already taken
    /// - `CatalogError::Storage` on a store fault
    pub fn create(&self, input: ProductInput) -> Result<i64, CatalogError> {
        let fields = validate_product(input)?;
        let id = self.store.insert(&fields)?;
        log::info!("created product {id} (sku {})", fields.sku);
        Ok(id)
    }

    /// Validate and replace every writable field of product `id`.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogService::create`].
    pub fn update(&self, id: i64, input: ProductInput) -> Result<WriteOutcome, CatalogError> {
        let fields = validate_product(input)?;
        let outcome = WriteOutcome::from_rows_changed(self.store.update(id, &fields)?);
        match outcome {
            WriteOutcome::Applied => log::info!("updated product {id}"),
            WriteOutcome::NotFound => log::debug!("update skipped, product {id} not found"),
        }
        Ok(outcome)
    }

    /// Delete product `id`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on a store fault.
    pub fn delete(&self, id: i64) -> Result<WriteOutcome, CatalogError> {
        let outcome = WriteOutcome::from_rows_changed(self.store.delete(id)?);
        match outcome {
            WriteOutcome::Applied => log::info!("deleted product {id}"),
            WriteOutcome::NotFound => log::debug!("delete skipped, product {id} not found"),
        }
        Ok(outcome)
    }

    /// Store health as seen by the service.
    pub fn is_healthy(&self) -> bool {
        match self.store.check_health() {
            Ok(healthy) => healthy,
            Err(e) => {
                log::warn!("store health check failed: {e}");
                false
            }
        }
    }

    /// Shut the store down.
    pub fn shutdown(&self) {
        self.store.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::ProductFields;
    use crate::store::MemoryProductStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts store calls and fails every one of them.
    #[derive(Default)]
    struct BrokenStore {
        calls: AtomicUsize,
    }

    impl BrokenStore {
        fn fail<T>(&self) -> Result<T, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }
    }

    impl ProductStore for BrokenStore {
        fn initialize(&self) -> Result<(), StoreError> {
            self.fail()
        }
        fn list_all(&self) -> Result<Vec<Product>, StoreError> {
            self.fail()
        }
        fn get_by_id(&self, _id: i64) -> Result<Option<Product>, StoreError> {
            self.fail()
        }
        fn insert(&self, _fields: &ProductFields) -> Result<i64, StoreError> {
            self.fail()
        }
        fn update(&self, _id: i64, _fields: &ProductFields) -> Result<u64, StoreError> {
            self.fail()
        }
        fn delete(&self, _id: i64) -> Result<u64, StoreError> {
            self.fail()
        }
        fn check_health(&self) -> Result<bool, StoreError> {
            self.fail()
        }
    }

    fn input(sku: &str) -> ProductInput {
        ProductFields::new("Earrings", sku, 45.0).into()
    }

    #[test]
    fn test_invalid_input_never_reaches_store() {
        let service = CatalogService::new(BrokenStore::default());
        let bad = ProductInput {
            name: None,
            ..input("E-1")
        };
        assert!(matches!(service.create(bad.clone()), Err(CatalogError::InvalidInput(_))));
        assert!(matches!(service.update(1, bad), Err(CatalogError::InvalidInput(_))));
        assert_eq!(service.store().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_storage_errors_pass_through() {
        let service = CatalogService::new(BrokenStore::default());
        assert!(matches!(
            service.list(),
            Err(CatalogError::Storage(StoreError::Unavailable(_)))
        ));
        assert!(matches!(service.get(1), Err(CatalogError::Storage(_))));
        assert!(matches!(service.create(input("E-2")), Err(CatalogError::Storage(_))));
        assert!(matches!(service.delete(1), Err(CatalogError::Storage(_))));
        assert!(!service.is_healthy());
    }

    #[test]
    fn test_write_outcomes() {
        let service = CatalogService::new(MemoryProductStore::new());
        let id = service.create(input("E-3")).unwrap();
        assert_eq!(service.update(id, input("E-3")).unwrap(), WriteOutcome::Applied);
        assert_eq!(service.update(id + 1, input("E-4")).unwrap(), WriteOutcome::NotFound);
        assert_eq!(service.delete(id).unwrap(), WriteOutcome::Applied);
        assert_eq!(service.delete(id).unwrap(), WriteOutcome::NotFound);
        assert_eq!(service.get(id).unwrap(), None);
    }

    #[test]
    fn test_duplicate_sku_is_conflict() {
        let service = CatalogService::new(MemoryProductStore::new());
        service.create(input("E-5")).unwrap();
        assert!(matches!(service.create(input("E-5")), Err(CatalogError::Conflict(_))));
    }
}
