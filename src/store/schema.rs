//! `products` table definition

use crate::error::StoreError;
use crate::executor::SqlExecutor;

/// Table name
pub const PRODUCTS_TABLE: &str = "products";

/// `gemstone_id` and `supplier_id` point at tables owned elsewhere. They are plain nullable
/// columns so the table can be created whether or not those tables exist.
const CREATE_PRODUCTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        category TEXT,
        sku TEXT NOT NULL,
        barcode TEXT,
        weight DOUBLE PRECISION,
        purity DOUBLE PRECISION,
        gemstone_id BIGINT,
        price DOUBLE PRECISION NOT NULL,
        labor_cost DOUBLE PRECISION,
        tax_rate DOUBLE PRECISION,
        discount DOUBLE PRECISION,
        stock_quantity INTEGER NOT NULL DEFAULT 0,
        min_stock_alert INTEGER NOT NULL DEFAULT 1,
        supplier_id BIGINT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        is_custom_order BOOLEAN NOT NULL DEFAULT FALSE,
        CONSTRAINT products_sku_key UNIQUE (sku),
        CONSTRAINT products_barcode_key UNIQUE (barcode)
    )
"#;

/// Create the `products` table if it does not exist.
///
/// A `UNIQUE` constraint ignores NULLs in PostgreSQL, which gives `barcode` its
/// unique-when-present rule.
///
/// # Errors
///
/// Returns `StoreError` if the DDL fails.
pub fn initialize_products_table(executor: &dyn SqlExecutor) -> Result<(), StoreError> {
    executor.execute(CREATE_PRODUCTS_TABLE, &[])?;
    log::debug!("{PRODUCTS_TABLE} table ready");
    Ok(())
}
