// Cart Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::Product;
use serde::{Deserialize, Serialize};

/// One line of the active cart, keyed by product id.
///
/// Also the element type of the frozen `Sale::items` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub barcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLine {
    /// Line for `quantity` units of a catalog product (price captured now)
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            barcode: product.barcode.clone(),
            image: product.image.clone(),
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Cart quantities are always >= 1
pub fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity < 1 {
        return Err(DomainError::InvalidQuantity(quantity));
    }
    Ok(())
}
