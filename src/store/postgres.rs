//! PostgreSQL product store.

use super::params::with_converted_params;
use super::schema::{initialize_products_table, PRODUCTS_TABLE};
use super::ProductStore;
use crate::error::StoreError;
use crate::executor::{MayPostgresExecutor, SqlExecutor};
use crate::model::{Product, ProductFields};
use may_postgres::types::FromSql;
use may_postgres::Row;
use sea_query::{Expr, ExprTrait, Iden, Order, PostgresQueryBuilder, Query, Value};

/// `products` table identifier
#[derive(Copy, Clone, Debug)]
struct ProductTable;

impl Iden for ProductTable {
    fn unquoted(&self) -> &str {
        PRODUCTS_TABLE
    }
}

/// Columns of the `products` table
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ProductColumn {
    Id,
    Name,
    Description,
    Category,
    Sku,
    Barcode,
    Weight,
    Purity,
    GemstoneId,
    Price,
    LaborCost,
    TaxRate,
    Discount,
    StockQuantity,
    MinStockAlert,
    SupplierId,
    IsActive,
    IsCustomOrder,
    CreatedAt,
    UpdatedAt,
}

impl Iden for ProductColumn {
    fn unquoted(&self) -> &str {
        match self {
            ProductColumn::Id => "id",
            ProductColumn::Name => "name",
            ProductColumn::Description => "description",
            ProductColumn::Category => "category",
            ProductColumn::Sku => "sku",
            ProductColumn::Barcode => "barcode",
            ProductColumn::Weight => "weight",
            ProductColumn::Purity => "purity",
            ProductColumn::GemstoneId => "gemstone_id",
            ProductColumn::Price => "price",
            ProductColumn::LaborCost => "labor_cost",
            ProductColumn::TaxRate => "tax_rate",
            ProductColumn::Discount => "discount",
            ProductColumn::StockQuantity => "stock_quantity",
            ProductColumn::MinStockAlert => "min_stock_alert",
            ProductColumn::SupplierId => "supplier_id",
            ProductColumn::IsActive => "is_active",
            ProductColumn::IsCustomOrder => "is_custom_order",
            ProductColumn::CreatedAt => "created_at",
            ProductColumn::UpdatedAt => "updated_at",
        }
    }
}

/// Columns a caller writes, in the order [`writable_values`] yields them.
const WRITABLE_COLUMNS: [ProductColumn; 17] = [
    ProductColumn::Name,
    ProductColumn::Description,
    ProductColumn::Category,
    ProductColumn::Sku,
    ProductColumn::Barcode,
    ProductColumn::Weight,
    ProductColumn::Purity,
    ProductColumn::GemstoneId,
    ProductColumn::Price,
    ProductColumn::LaborCost,
    ProductColumn::TaxRate,
    ProductColumn::Discount,
    ProductColumn::StockQuantity,
    ProductColumn::MinStockAlert,
    ProductColumn::SupplierId,
    ProductColumn::IsActive,
    ProductColumn::IsCustomOrder,
];

/// Every column, in the order a full product row is selected.
const ALL_COLUMNS: [ProductColumn; 20] = [
    ProductColumn::Id,
    ProductColumn::Name,
    ProductColumn::Description,
    ProductColumn::Category,
    ProductColumn::Sku,
    ProductColumn::Barcode,
    ProductColumn::Weight,
    ProductColumn::Purity,
    ProductColumn::GemstoneId,
    ProductColumn::Price,
    ProductColumn::LaborCost,
    ProductColumn::TaxRate,
    ProductColumn::Discount,
    ProductColumn::StockQuantity,
    ProductColumn::MinStockAlert,
    ProductColumn::SupplierId,
    ProductColumn::IsActive,
    ProductColumn::IsCustomOrder,
    ProductColumn::CreatedAt,
    ProductColumn::UpdatedAt,
];

/// `updated_at` always moves forward, even when two writes land in the same transaction
/// timestamp.
const TOUCH_UPDATED_AT: &str = "GREATEST(CURRENT_TIMESTAMP, updated_at + INTERVAL '1 microsecond')";

fn writable_values(fields: &ProductFields) -> [Value; 17] {
    [
        fields.name.clone().into(),
        fields.description.clone().into(),
        fields.category.clone().into(),
        fields.sku.clone().into(),
        fields.barcode.clone().into(),
        fields.weight.into(),
        fields.purity.into(),
        fields.gemstone_id.into(),
        fields.price.into(),
        fields.labor_cost.into(),
        fields.tax_rate.into(),
        fields.discount.into(),
        fields.stock_quantity.into(),
        fields.min_stock_alert.into(),
        fields.supplier_id.into(),
        fields.is_active.into(),
        fields.is_custom_order.into(),
    ]
}

fn column<'a, T: FromSql<'a>>(row: &'a Row, col: ProductColumn) -> Result<T, StoreError> {
    row.try_get(col.unquoted())
        .map_err(|e| StoreError::Decode(format!("column {}: {e}", col.unquoted())))
}

fn product_from_row(row: &Row) -> Result<Product, StoreError> {
    Ok(Product {
        id: column(row, ProductColumn::Id)?,
        fields: ProductFields {
            name: column(row, ProductColumn::Name)?,
            description: column(row, ProductColumn::Description)?,
            category: column(row, ProductColumn::Category)?,
            sku: column(row, ProductColumn::Sku)?,
            barcode: column(row, ProductColumn::Barcode)?,
            weight: column(row, ProductColumn::Weight)?,
            purity: column(row, ProductColumn::Purity)?,
            gemstone_id: column(row, ProductColumn::GemstoneId)?,
            price: column(row, ProductColumn::Price)?,
            labor_cost: column(row, ProductColumn::LaborCost)?,
            tax_rate: column(row, ProductColumn::TaxRate)?,
            discount: column(row, ProductColumn::Discount)?,
            stock_quantity: column(row, ProductColumn::StockQuantity)?,
            min_stock_alert: column(row, ProductColumn::MinStockAlert)?,
            supplier_id: column(row, ProductColumn::SupplierId)?,
            is_active: column(row, ProductColumn::IsActive)?,
            is_custom_order: column(row, ProductColumn::IsCustomOrder)?,
        },
        created_at: column(row, ProductColumn::CreatedAt)?,
        updated_at: column(row, ProductColumn::UpdatedAt)?,
    })
}

/// Product store over a PostgreSQL connection.
///
/// Every call is a fresh round trip; nothing is cached. Uniqueness of `sku` and `barcode`
/// is left to the table's constraints, so two racing inserts of the same `sku` resolve
/// inside PostgreSQL and the loser gets `StoreError::Constraint`.
pub struct PgProductStore<E: SqlExecutor = MayPostgresExecutor> {
    executor: E,
}

impl PgProductStore<MayPostgresExecutor> {
    /// Connect to `url` and create the `products` table if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the connection or the table creation fails.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let executor = MayPostgresExecutor::connect(url)?;
        let store = Self::new(executor);
        store.initialize()?;
        log::info!("PostgreSQL product store ready");
        Ok(store)
    }
}

impl<E: SqlExecutor> PgProductStore<E> {
    /// Wrap an executor. Call [`ProductStore::initialize`] before use.
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// The underlying executor
    pub fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E: SqlExecutor> ProductStore for PgProductStore<E> {
    fn initialize(&self) -> Result<(), StoreError> {
        initialize_products_table(&self.executor)
    }

    fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        let (sql, values) = Query::select()
            .columns(ALL_COLUMNS)
            .from(ProductTable)
            .order_by(ProductColumn::Id, Order::Asc)
            .build(PostgresQueryBuilder);

        let rows = with_converted_params(&values, |params| self.executor.query_all(&sql, params))?;
        rows.iter().map(product_from_row).collect()
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let (sql, values) = Query::select()
            .columns(ALL_COLUMNS)
            .from(ProductTable)
            .and_where(Expr::col(ProductColumn::Id).eq(id))
            .build(PostgresQueryBuilder);

        let rows = with_converted_params(&values, |params| self.executor.query_all(&sql, params))?;
        rows.first().map(product_from_row).transpose()
    }

    fn insert(&self, fields: &ProductFields) -> Result<i64, StoreError> {
        let mut query = Query::insert();
        query.into_table(ProductTable).columns(WRITABLE_COLUMNS);
        query
            .values(writable_values(fields).into_iter().map(Expr::val))
            .map_err(|e| StoreError::Query(format!("failed to build insert: {e}")))?;
        query.returning_col(ProductColumn::Id);
        let (sql, values) = query.build(PostgresQueryBuilder);

        let row = with_converted_params(&values, |params| self.executor.query_one(&sql, params))?;
        column(&row, ProductColumn::Id)
    }

    fn update(&self, id: i64, fields: &ProductFields) -> Result<u64, StoreError> {
        let mut query = Query::update();
        query.table(ProductTable);
        for (col, value) in WRITABLE_COLUMNS.into_iter().zip(writable_values(fields)) {
            query.value(col, Expr::val(value));
        }
        query
            .value(ProductColumn::UpdatedAt, Expr::cust(TOUCH_UPDATED_AT))
            .and_where(Expr::col(ProductColumn::Id).eq(id));
        let (sql, values) = query.build(PostgresQueryBuilder);

        with_converted_params(&values, |params| self.executor.execute(&sql, params))
    }

    fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let (sql, values) = Query::delete()
            .from_table(ProductTable)
            .and_where(Expr::col(ProductColumn::Id).eq(id))
            .build(PostgresQueryBuilder);

        with_converted_params(&values, |params| self.executor.execute(&sql, params))
    }

    fn check_health(&self) -> Result<bool, StoreError> {
        self.executor.check_health()
    }

    fn shutdown(&self) {
        log::info!("PostgreSQL product store shutting down");
    }
}
