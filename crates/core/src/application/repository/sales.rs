// Sales Repository
//
// `items` is stored as a JSON snapshot of the cart lines; later cart or
// catalog edits never reach a stored sale.

use crate::application::Database;
use crate::domain::{CartLine, PaymentMethod, Sale};
use crate::error::{Result, StoreError};
use crate::params;
use crate::port::Row;

/// Used by callers that do not pick a limit
pub const DEFAULT_SALES_LIMIT: u32 = 100;

pub struct SalesRepository<'a> {
    db: &'a Database,
}

impl<'a> SalesRepository<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Newest first, at most `limit` sales
    pub async fn list(&self, limit: u32) -> Result<Vec<Sale>> {
        let rows = self
            .db
            .query(
                r#"
                SELECT id, items, total, payment_method, cash_amount, change_amount, timestamp
                FROM sales
                ORDER BY timestamp DESC, rowid DESC
                LIMIT ?
                "#,
                &params![limit],
            )
            .await?;
        rows.iter().map(row_to_sale).collect()
    }

    pub async fn add(&self, sale: &Sale) -> Result<()> {
        let items = serde_json::to_string(&sale.items)?;

        self.db
            .execute(
                r#"
                INSERT INTO sales
                    (id, items, total, payment_method, cash_amount, change_amount, timestamp)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                &params![
                    &sale.id,
                    items,
                    sale.total,
                    sale.payment_method.as_str(),
                    sale.cash_amount,
                    sale.change,
                    sale.timestamp
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<u64> {
        self.db
            .execute("DELETE FROM sales WHERE id = ?", &params![id])
            .await
    }
}

fn row_to_sale(row: &Row) -> Result<Sale> {
    let id = row.text("id")?;
    let items: Vec<CartLine> = serde_json::from_str(&row.text("items")?).map_err(|e| {
        StoreError::Serialization(format!("sale {} items: {}", id, e))
    })?;

    Ok(Sale {
        id,
        items,
        total: row.real("total")?,
        payment_method: row.text("payment_method")?.parse::<PaymentMethod>()?,
        cash_amount: row.opt_real("cash_amount")?,
        change: row.opt_real("change_amount")?,
        timestamp: row.integer("timestamp")?,
    })
}
