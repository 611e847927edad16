// Product Repository

use crate::application::Database;
use crate::domain::{Product, ProductPatch};
use crate::error::Result;
use crate::params;
use crate::port::Row;
use tracing::debug;

const PRODUCT_COLUMNS: &str =
    "id, name, price, barcode, category, stock, image, description, created_at";

pub struct ProductRepository<'a> {
    db: &'a Database,
}

impl<'a> ProductRepository<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All products ordered by name
    pub async fn list(&self) -> Result<Vec<Product>> {
        let rows = self
            .db
            .query(
                &format!("SELECT {} FROM products ORDER BY name", PRODUCT_COLUMNS),
                &[],
            )
            .await?;
        rows.iter().map(row_to_product).collect()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Product>> {
        self.find_one("id", id).await
    }

    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>> {
        self.find_one("barcode", barcode).await
    }

    /// Insert a product. A duplicate barcode fails with
    /// `StoreError::ConstraintViolation` and leaves the existing row as is.
    pub async fn add(&self, product: &Product) -> Result<()> {
        self.db
            .execute(
                &format!(
                    "INSERT INTO products ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    PRODUCT_COLUMNS
                ),
                &params![
                    &product.id,
                    &product.name,
                    product.price,
                    &product.barcode,
                    &product.category,
                    product.stock,
                    product.image.clone(),
                    product.description.clone(),
                    product.created_at
                ],
            )
            .await?;

        debug!(id = %product.id, barcode = %product.barcode, "Product added");
        Ok(())
    }

    /// Read the current row, merge `patch` onto it, write every column back.
    /// Unknown ids are a no-op returning 0.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> Result<u64> {
        let current = match self.find_by_id(id).await? {
            Some(product) => product,
            None => return Ok(0),
        };
        let merged = patch.apply(current);

        self.db
            .execute(
                r#"
                UPDATE products
                SET name = ?, price = ?, barcode = ?, category = ?, stock = ?,
                    image = ?, description = ?
                WHERE id = ?
                "#,
                &params![
                    &merged.name,
                    merged.price,
                    &merged.barcode,
                    &merged.category,
                    merged.stock,
                    merged.image,
                    merged.description,
                    id
                ],
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<u64> {
        self.db
            .execute("DELETE FROM products WHERE id = ?", &params![id])
            .await
    }

    /// Case-insensitive match on name or description, partial match on barcode
    pub async fn search(&self, term: &str) -> Result<Vec<Product>> {
        let pattern = format!("%{}%", term.to_lowercase());
        let rows = self
            .db
            .query(
                &format!(
                    r#"
                    SELECT {} FROM products
                    WHERE lower(name) LIKE ?
                       OR barcode LIKE ?
                       OR lower(COALESCE(description, '')) LIKE ?
                    ORDER BY name
                    "#,
                    PRODUCT_COLUMNS
                ),
                &params![&pattern, &pattern, &pattern],
            )
            .await?;
        rows.iter().map(row_to_product).collect()
    }

    /// Products with `stock <= threshold`, lowest stock first
    pub async fn low_stock(&self, threshold: i64) -> Result<Vec<Product>> {
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT {} FROM products WHERE stock <= ? ORDER BY stock, name",
                    PRODUCT_COLUMNS
                ),
                &params![threshold],
            )
            .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Product>> {
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT {} FROM products WHERE {} = ? LIMIT 1",
                    PRODUCT_COLUMNS, column
                ),
                &params![value],
            )
            .await?;
        rows.first().map(row_to_product).transpose()
    }
}

fn row_to_product(row: &Row) -> Result<Product> {
    Ok(Product {
        id: row.text("id")?,
        name: row.text("name")?,
        price: row.real("price")?,
        barcode: row.text("barcode")?,
        category: row.opt_text("category")?.unwrap_or_default(),
        stock: row.opt_integer("stock")?.unwrap_or(0),
        image: row.opt_text("image")?,
        description: row.opt_text("description")?,
        created_at: row.integer("created_at")?,
    })
}
