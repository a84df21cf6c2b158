use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub i64);

/// One catalog row as read from the catalog store.
///
/// The `Display` impl is the grounding line sent to the LLM backend; field
/// order and wording are fixed so the system prompt stays stable for the
/// lifetime of the process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub characteristics: String,
    pub price: Decimal,
    pub stock: u32,
    pub warranty_years: u32,
    pub category: String,
}

impl fmt::Display for ProductRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Товар: {}, Категория: {}, Характеристики: {}, Цена: {} руб., Остаток: {} шт., Гарантия: {} лет",
            self.name,
            self.category,
            self.characteristics,
            self.price,
            self.stock,
            self.warranty_years
        )
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{ProductId, ProductRecord};

    fn record(price: Decimal) -> ProductRecord {
        ProductRecord {
            id: ProductId(7),
            name: "Kettle K2".to_string(),
            characteristics: "1.7 l, 2200 W".to_string(),
            price,
            stock: 0,
            warranty_years: 1,
            category: "Kitchen".to_string(),
        }
    }

    #[test]
    fn renders_all_fields_in_fixed_order() {
        assert_eq!(
            record(Decimal::new(4990, 0)).to_string(),
            "Товар: Kettle K2, Категория: Kitchen, Характеристики: 1.7 l, 2200 W, Цена: 4990 руб., Остаток: 0 шт., Гарантия: 1 лет"
        );
    }

    #[test]
    fn fractional_price_keeps_its_scale() {
        let rendered = record(Decimal::new(499_050, 2)).to_string();
        assert!(rendered.contains("Цена: 4990.50 руб."), "unexpected rendering: {rendered}");
    }
}
