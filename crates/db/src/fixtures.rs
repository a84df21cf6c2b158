
use crate::connection::DbPool;
use crate::repositories::RepositoryError;

struct DemoProduct {
    id: i64,
    name: &'static str,
    characteristics: &'static str,
    price: &'static str,
    stock: i64,
    warranty_years: i64,
    category: &'static str,
}

/// Demo catalog used by `shopdesk seed`. Ids are stable so reseeding replaces rows.
const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        id: 1,
        name: "Ноутбук Aero 14",
        characteristics: "14\", Ryzen 7, 16 ГБ ОЗУ, SSD 512 ГБ",
        price: "84990",
        stock: 12,
        warranty_years: 2,
        category: "Ноутбуки",
    },
    DemoProduct {
        id: 2,
        name: "Смартфон Nova 5",
        characteristics: "6.5\" AMOLED, 128 ГБ, NFC",
        price: "32990",
        stock: 40,
        warranty_years: 1,
        category: "Смартфоны",
    },
    DemoProduct {
        id: 3,
        name: "Наушники Pulse ANC",
        characteristics: "Bluetooth 5.3, активное шумоподавление, 30 ч",
        price: "8990.50",
        stock: 0,
        warranty_years: 1,
        category: "Аудио",
    },
    DemoProduct {
        id: 4,
        name: "Монитор Vista 27",
        characteristics: "27\", IPS, 2560x1440, 165 Гц",
        price: "27490",
        stock: 7,
        warranty_years: 3,
        category: "Мониторы",
    },
    DemoProduct {
        id: 5,
        name: "Роутер Mesh Duo",
        characteristics: "Wi-Fi 6, 2 модуля, до 250 м²",
        price: "12990",
        stock: 15,
        warranty_years: 2,
        category: "Сетевое оборудование",
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub products_seeded: usize,
    pub catalog_total: i64,
}

pub struct DemoCatalog;

impl DemoCatalog {
    pub fn len() -> usize {
        DEMO_PRODUCTS.len()
    }

    /// Upserts the demo products into `products`. Expects migrations to have run.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        for product in DEMO_PRODUCTS {
            sqlx::query(
                "INSERT OR REPLACE INTO products
                    (id, name, characteristics, price, stock, warranty_years, category)
                 VALUES (?, ?, ?, CAST(? AS NUMERIC), ?, ?, ?)",
            )
            .bind(product.id)
            .bind(product.name)
            .bind(product.characteristics)
            .bind(product.price)
            .bind(product.stock)
            .bind(product.warranty_years)
            .bind(product.category)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let catalog_total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(pool).await?;

        Ok(SeedResult { products_seeded: DEMO_PRODUCTS.len(), catalog_total })
    }
}

#[cfg(test)]
mod tests {
    use shopdesk_core::catalog::CatalogSource;

    use super::DemoCatalog;
    use crate::{connect_with_settings, migrations, SqlCatalogSource};

    #[tokio::test]
    async fn seeding_twice_keeps_catalog_stable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let first = DemoCatalog::load(&pool).await.expect("first seed");
        let second = DemoCatalog::load(&pool).await.expect("second seed");

        assert_eq!(first.products_seeded, DemoCatalog::len());
        assert_eq!(second.catalog_total, DemoCatalog::len() as i64);

        let products =
            SqlCatalogSource::with_pool(pool.clone()).fetch_all().await.expect("fetch");
        assert_eq!(products.len(), DemoCatalog::len());
        let headphones = products.iter().find(|p| p.id.0 == 3).expect("headphones");
        assert_eq!(headphones.price.to_string(), "8990.5");
        assert_eq!(headphones.stock, 0);

        pool.close().await;
    }
}
