use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::warn;

use shopdesk_core::catalog::{CatalogError, CatalogSource};
use shopdesk_core::domain::product::{ProductId, ProductRecord};

use crate::{connect_read_only, DbPool};

const SELECT_PRODUCTS: &str = "SELECT id, name, characteristics, CAST(price AS TEXT) AS price, \
     stock, warranty_years, category FROM products";

enum Store {
    Url { database_url: String, timeout_secs: u64 },
    Pool(DbPool),
}

/// Reads the `products` table.
///
/// Built from a URL it opens a short-lived read-only connection for each
/// load and closes it afterwards; built from a pool it reads through it.
pub struct SqlCatalogSource {
    store: Store,
}

impl SqlCatalogSource {
    pub fn new(database_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self { store: Store::Url { database_url: database_url.into(), timeout_secs } }
    }

    pub fn with_pool(pool: DbPool) -> Self {
        Self { store: Store::Pool(pool) }
    }

    async fn fetch_rows(pool: &DbPool) -> Result<Vec<ProductRecord>, CatalogError> {
        let rows = sqlx::query(SELECT_PRODUCTS)
            .fetch_all(pool)
            .await
            .map_err(|error| CatalogError::Query(error.to_string()))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            match decode_product(row) {
                Ok(product) => products.push(product),
                Err(reason) => warn!(
                    event_name = "catalog.load.row_skipped",
                    correlation_id = "bootstrap",
                    reason = %reason,
                    "skipping malformed catalog row"
                ),
            }
        }
        Ok(products)
    }
}

#[async_trait]
impl CatalogSource for SqlCatalogSource {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        match &self.store {
            Store::Pool(pool) => Self::fetch_rows(pool).await,
            Store::Url { database_url, timeout_secs } => {
                let pool = connect_read_only(database_url, *timeout_secs)
                    .await
                    .map_err(|error| CatalogError::Unavailable(error.to_string()))?;
                let result = Self::fetch_rows(&pool).await;
                pool.close().await;
                result
            }
        }
    }
}

fn decode_product(row: &SqliteRow) -> Result<ProductRecord, String> {
    let id: i64 = row.try_get("id").map_err(|error| error.to_string())?;
    let field = |name: &str| -> Result<String, String> {
        row.try_get::<Option<String>, _>(name)
            .map(Option::unwrap_or_default)
            .map_err(|error| format!("product {id}: {name}: {error}"))
    };

    let raw_price = row
        .try_get::<Option<String>, _>("price")
        .map_err(|error| format!("product {id}: price: {error}"))?
        .ok_or_else(|| format!("product {id}: price is NULL"))?;
    let price = parse_price(&raw_price)
        .ok_or_else(|| format!("product {id}: unparseable price `{raw_price}`"))?;

    Ok(ProductRecord {
        id: ProductId(id),
        name: field("name")?,
        characteristics: field("characteristics")?,
        price,
        stock: non_negative(row, "stock", id)?,
        warranty_years: non_negative(row, "warranty_years", id)?,
        category: field("category")?,
    })
}

fn non_negative(row: &SqliteRow, column: &str, id: i64) -> Result<u32, String> {
    let value: i64 = row.try_get(column).map_err(|error| format!("product {id}: {column}: {error}"))?;
    u32::try_from(value).map_err(|_| format!("product {id}: {column} out of range ({value})"))
}

fn parse_price(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)).ok()
}
