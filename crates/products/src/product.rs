use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tienda_core::{ColumnSpec, TableSchema};

/// Column constraints for the `products` table.
///
/// `price` additionally carries a `CHECK (price > 0)` enforced by the
/// persistence gateway (and by the Postgres DDL).
pub const PRODUCTS_SCHEMA: TableSchema = TableSchema {
    table: "products",
    columns: &[
        ColumnSpec {
            name: "name",
            max_len: Some(100),
            required: true,
            unique: false,
        },
        ColumnSpec {
            name: "price",
            max_len: None,
            required: true,
            unique: false,
        },
        ColumnSpec {
            name: "availability",
            max_len: None,
            required: false,
            unique: false,
        },
    ],
};

/// A stored product row.
///
/// `id` is store-assigned and immutable; `price > 0` holds for every stored
/// row. Timestamps are maintained by the persistence gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub availability: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes for inserting a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub availability: bool,
}

/// Full-row replacement attributes (PUT semantics).
///
/// There is deliberately no way to express a change to `id` or to the
/// timestamps; those stay with the stored row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductChanges {
    pub name: String,
    pub price: Decimal,
    pub availability: bool,
}

impl Product {
    /// Overwrite the mutable fields from a change set.
    pub fn apply(&mut self, changes: &ProductChanges) {
        self.name = changes.name.clone();
        self.price = changes.price;
        self.availability = changes.availability;
    }

    /// Change set that flips `availability` and keeps everything else.
    pub fn toggled(&self) -> ProductChanges {
        ProductChanges {
            name: self.name.clone(),
            price: self.price,
            availability: !self.availability,
        }
    }
}
