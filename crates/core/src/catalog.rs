use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::product::{ProductId, ProductRecord};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
    #[error("catalog query failed: {0}")]
    Query(String),
}

/// Read-only access to the catalog store.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns every catalog row in store iteration order.
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, CatalogError>;
}

/// Point-in-time copy of the catalog, fixed for the process lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    products: Vec<ProductRecord>,
}

impl CatalogSnapshot {
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, product_id: ProductId) -> Option<&ProductRecord> {
        self.products.iter().find(|product| product.id == product_id)
    }
}

/// Loads the snapshot once. A failing store yields an empty snapshot so the
/// service can still start without grounding data.
pub async fn load_snapshot(source: &dyn CatalogSource) -> CatalogSnapshot {
    match source.fetch_all().await {
        Ok(products) => {
            info!(
                event_name = "catalog.load.completed",
                correlation_id = "bootstrap",
                product_count = products.len(),
                "catalog snapshot loaded"
            );
            CatalogSnapshot::new(products)
        }
        Err(error) => {
            error!(
                event_name = "catalog.load.failed",
                correlation_id = "bootstrap",
                error = %error,
                "catalog snapshot unavailable, continuing with an empty catalog"
            );
            CatalogSnapshot::default()
        }
    }
}

/// In-memory catalog, used for fixtures and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    products: Vec<ProductRecord>,
}

impl StaticCatalog {
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        Ok(self.products.clone())
    }
}
