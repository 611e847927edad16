// Product Domain Model

use serde::{Deserialize, Serialize};

/// Catalog product. `barcode` is unique across the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub barcode: String,
    pub category: String,
    pub stock: i64,
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_at: i64, // epoch ms
}

impl Product {
    /// Create a product with no image/description
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        barcode: impl Into<String>,
        category: impl Into<String>,
        stock: i64,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            barcode: barcode.into(),
            category: category.into(),
            stock,
            image: None,
            description: None,
            created_at,
        }
    }
}

/// Partial product update. `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge onto the current row; `id` and `created_at` are never patched
    pub fn apply(self, current: Product) -> Product {
        Product {
            id: current.id,
            name: self.name.unwrap_or(current.name),
            price: self.price.unwrap_or(current.price),
            barcode: self.barcode.unwrap_or(current.barcode),
            category: self.category.unwrap_or(current.category),
            stock: self.stock.unwrap_or(current.stock),
            image: self.image.or(current.image),
            description: self.description.or(current.description),
            created_at: current.created_at,
        }
    }
}
