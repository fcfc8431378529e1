//! Product catalog data model.
//!
//! - [`ProductInput`] is the raw request shape: every field optional, exactly what a caller sent.
//! - [`ProductFields`] is the validated, writable part of a product with defaults applied.
//!   Inserts and updates both take a full `ProductFields`; updates replace, never merge.
//! - [`Product`] is a stored row: the writable fields plus the store-owned `id` and timestamps.
//!
//! JSON field names are the snake_case column names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default for `stock_quantity`
pub const DEFAULT_STOCK_QUANTITY: i32 = 0;
/// Default for `min_stock_alert`
pub const DEFAULT_MIN_STOCK_ALERT: i32 = 1;

/// Writable product attributes, validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sku: String,
    pub barcode: Option<String>,
    pub weight: Option<f64>,
    pub purity: Option<f64>,
    /// Reference to a gemstone owned by another service; never resolved here.
    pub gemstone_id: Option<i64>,
    pub price: f64,
    pub labor_cost: Option<f64>,
    pub tax_rate: Option<f64>,
    pub discount: Option<f64>,
    pub stock_quantity: i32,
    pub min_stock_alert: i32,
    /// Reference to a supplier owned by another service; never resolved here.
    pub supplier_id: Option<i64>,
    pub is_active: bool,
    pub is_custom_order: bool,
}

impl ProductFields {
    /// Minimal valid product with every optional attribute unset and defaults applied.
    pub fn new(name: impl Into<String>, sku: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            sku: sku.into(),
            barcode: None,
            weight: None,
            purity: None,
            gemstone_id: None,
            price,
            labor_cost: None,
            tax_rate: None,
            discount: None,
            stock_quantity: DEFAULT_STOCK_QUANTITY,
            min_stock_alert: DEFAULT_MIN_STOCK_ALERT,
            supplier_id: None,
            is_active: true,
            is_custom_order: false,
        }
    }
}

/// A persisted product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(flatten)]
    pub fields: ProductFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated product payload as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub weight: Option<f64>,
    pub purity: Option<f64>,
    pub gemstone_id: Option<i64>,
    pub price: Option<f64>,
    pub labor_cost: Option<f64>,
    pub tax_rate: Option<f64>,
    pub discount: Option<f64>,
    pub stock_quantity: Option<i32>,
    pub min_stock_alert: Option<i32>,
    pub supplier_id: Option<i64>,
    pub is_active: Option<bool>,
    pub is_custom_order: Option<bool>,
}

impl From<ProductFields> for ProductInput {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: Some(fields.name),
            description: fields.description,
            category: fields.category,
            sku: Some(fields.sku),
            barcode: fields.barcode,
            weight: fields.weight,
            purity: fields.purity,
            gemstone_id: fields.gemstone_id,
            price: Some(fields.price),
            labor_cost: fields.labor_cost,
            tax_rate: fields.tax_rate,
            discount: fields.discount,
            stock_quantity: Some(fields.stock_quantity),
            min_stock_alert: Some(fields.min_stock_alert),
            supplier_id: fields.supplier_id,
            is_active: Some(fields.is_active),
            is_custom_order: Some(fields.is_custom_order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_serializes_flat_snake_case() {
        let product = Product {
            id: 7,
            fields: ProductFields::new("Ring", "RING-001", 120.0),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["sku"], "RING-001");
        assert_eq!(json["min_stock_alert"], 1);
        assert_eq!(json["is_active"], true);
        assert!(json.get("fields").is_none());
        assert!(json["gemstone_id"].is_null());
    }

    #[test]
    fn test_input_accepts_partial_payload() {
        let input: ProductInput =
            serde_json::from_str(r#"{"name":"Bracelet","price":12.5,"supplier_id":3}"#).unwrap();
        assert_eq!(input.name.as_deref(), Some("Bracelet"));
        assert_eq!(input.price, Some(12.5));
        assert_eq!(input.supplier_id, Some(3));
        assert!(input.sku.is_none());
        assert!(input.is_active.is_none());
    }

    #[test]
    fn test_input_from_fields_keeps_everything() {
        let mut fields = ProductFields::new("Pendant", "PEN-9", 80.0);
        fields.barcode = Some("400123".to_string());
        fields.stock_quantity = 4;
        let input = ProductInput::from(fields);
        assert_eq!(input.barcode.as_deref(), Some("400123"));
        assert_eq!(input.stock_quantity, Some(4));
        assert_eq!(input.is_custom_order, Some(false));
    }
}
