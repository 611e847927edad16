// Cart Repository

use crate::application::Database;
use crate::domain::cart::validate_quantity;
use crate::domain::CartLine;
use crate::error::Result;
use crate::params;
use crate::port::Row;

pub struct CartRepository<'a> {
    db: &'a Database,
}

impl<'a> CartRepository<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Lines in insertion order
    pub async fn list(&self) -> Result<Vec<CartLine>> {
        let rows = self
            .db
            .query(
                "SELECT id, name, price, quantity, barcode, image FROM cart ORDER BY rowid",
                &[],
            )
            .await?;
        rows.iter().map(row_to_line).collect()
    }

    /// Add a line. An existing line with the same id gets its quantity
    /// increased instead of a second row.
    pub async fn add(&self, line: &CartLine) -> Result<()> {
        validate_quantity(line.quantity)?;

        self.db
            .execute(
                r#"
                INSERT INTO cart (id, name, price, quantity, barcode, image)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET quantity = quantity + excluded.quantity
                "#,
                &params![
                    &line.id,
                    &line.name,
                    line.price,
                    line.quantity,
                    &line.barcode,
                    line.image.clone()
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn set_quantity(&self, id: &str, quantity: i64) -> Result<u64> {
        validate_quantity(quantity)?;

        self.db
            .execute(
                "UPDATE cart SET quantity = ? WHERE id = ?",
                &params![quantity, id],
            )
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<u64> {
        self.db
            .execute("DELETE FROM cart WHERE id = ?", &params![id])
            .await
    }

    pub async fn clear(&self) -> Result<u64> {
        self.db.execute("DELETE FROM cart", &[]).await
    }

    /// Sum of price * quantity over all lines
    pub async fn total(&self) -> Result<f64> {
        let rows = self
            .db
            .query(
                "SELECT COALESCE(SUM(price * quantity), 0.0) AS total FROM cart",
                &[],
            )
            .await?;
        match rows.first() {
            Some(row) => row.real("total"),
            None => Ok(0.0),
        }
    }
}

fn row_to_line(row: &Row) -> Result<CartLine> {
    Ok(CartLine {
        id: row.text("id")?,
        name: row.text("name")?,
        price: row.real("price")?,
        quantity: row.integer("quantity")?,
        barcode: row.text("barcode")?,
        image: row.opt_text("image")?,
    })
}
