//! Input validation for catalog writes.
//!
//! Pure functions over the caller-supplied shape. Nothing here touches a store, so a request
//! that fails validation never reaches one.

use crate::error::CatalogError;
use crate::model::{ProductFields, ProductInput, DEFAULT_MIN_STOCK_ALERT, DEFAULT_STOCK_QUANTITY};

/// Parse an `id` path segment.
///
/// # Errors
///
/// Returns `CatalogError::InvalidInput` when the segment is not a base-10 integer.
pub fn parse_id(raw: &str) -> Result<i64, CatalogError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CatalogError::InvalidInput(format!("invalid product id: {raw:?}")))
}

/// Validate a product payload and apply column defaults.
///
/// The same rules apply to create and update:
/// - `name` and `sku` must be present and non-blank
/// - `price` must be present and non-zero
/// - `price`, `weight` and `purity` must be non-negative; every real must be finite
///
/// Every missing required field is reported in one error.
///
/// # Errors
///
/// Returns `CatalogError::InvalidInput` describing the first failing rule group.
pub fn validate_product(input: ProductInput) -> Result<ProductFields, CatalogError> {
    let name = non_blank(input.name);
    let sku = non_blank(input.sku);
    let price = input.price.filter(|p| *p != 0.0);

    let mut missing = Vec::new();
    if name.is_none() {
        missing.push("name");
    }
    if sku.is_none() {
        missing.push("sku");
    }
    if price.is_none() {
        missing.push("price");
    }

    let (Some(name), Some(sku), Some(price)) = (name, sku, price) else {
        return Err(CatalogError::missing_fields(&missing));
    };

    check_non_negative("price", Some(price))?;
    check_non_negative("weight", input.weight)?;
    check_non_negative("purity", input.purity)?;
    check_finite("labor_cost", input.labor_cost)?;
    check_finite("tax_rate", input.tax_rate)?;
    check_finite("discount", input.discount)?;

    Ok(ProductFields {
        name,
        description: input.description,
        category: input.category,
        sku,
        barcode: input.barcode,
        weight: input.weight,
        purity: input.purity,
        gemstone_id: input.gemstone_id,
        price,
        labor_cost: input.labor_cost,
        tax_rate: input.tax_rate,
        discount: input.discount,
        stock_quantity: input.stock_quantity.unwrap_or(DEFAULT_STOCK_QUANTITY),
        min_stock_alert: input.min_stock_alert.unwrap_or(DEFAULT_MIN_STOCK_ALERT),
        supplier_id: input.supplier_id,
        is_active: input.is_active.unwrap_or(true),
        is_custom_order: input.is_custom_order.unwrap_or(false),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn check_finite(field: &str, value: Option<f64>) -> Result<(), CatalogError> {
    match value {
        Some(v) if !v.is_finite() => Err(CatalogError::InvalidInput(format!(
            "{field} must be a finite number"
        ))),
        _ => Ok(()),
    }
}

fn check_non_negative(field: &str, value: Option<f64>) -> Result<(), CatalogError> {
    check_finite(field, value)?;
    match value {
        Some(v) if v < 0.0 => Err(CatalogError::InvalidInput(format!(
            "{field} must not be negative"
        ))),
        _ => Ok(()),
    }
}
