// Legacy Data Migration (one-time import guarded by a settings key)
//
// Every write is INSERT OR REPLACE so a crash mid-import can be repeated.
// The guard key is written last, only after all documents were imported.

use crate::domain::setting::MIGRATED_V1;
use crate::domain::{CartLine, PaymentMethod, ScanKind};
use crate::error::{Result, StoreError};
use crate::params;
use crate::port::legacy_source::{LEGACY_PRODUCTS, LEGACY_SALES, LEGACY_SCAN_HISTORY};
use crate::port::{Backend, LegacySource};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

/// What the migration guard decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Guard key already set, nothing read
    AlreadyMigrated,
    /// Import completed and guard key set
    Imported {
        products: usize,
        scans: usize,
        sales: usize,
    },
}

/// Run the legacy import unless the guard key says it already completed.
///
/// `now` stamps legacy records that carry no usable timestamp.
pub async fn run_legacy_import(
    backend: &dyn Backend,
    source: Option<&dyn LegacySource>,
    now: i64,
) -> Result<MigrationOutcome> {
    if is_migrated(backend).await? {
        debug!("Legacy import already done, skipping");
        return Ok(MigrationOutcome::AlreadyMigrated);
    }

    info!("Legacy import started...");

    let (products, scans, sales) = match source {
        Some(source) => (
            import_products(backend, source, now).await?,
            import_scan_history(backend, source, now).await?,
            import_sales(backend, source, now).await?,
        ),
        None => (0, 0, 0),
    };

    mark_migrated(backend).await?;

    info!(products, scans, sales, "Legacy import completed");
    Ok(MigrationOutcome::Imported {
        products,
        scans,
        sales,
    })
}

async fn is_migrated(backend: &dyn Backend) -> Result<bool> {
    let rows = backend
        .query(
            "SELECT value FROM settings WHERE key = ?",
            &params![MIGRATED_V1],
        )
        .await?;
    match rows.first() {
        Some(row) => Ok(row.text("value")? == "true"),
        None => Ok(false),
    }
}

/// Set the guard key. Also used after a full reset so the emptied store is
/// not refilled from legacy documents.
pub async fn mark_migrated(backend: &dyn Backend) -> Result<()> {
    backend
        .execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            &params![MIGRATED_V1, "true"],
        )
        .await?;
    Ok(())
}

async fn read_document<T: for<'de> Deserialize<'de>>(
    source: &dyn LegacySource,
    key: &str,
) -> Result<Vec<T>> {
    match source.read(key).await? {
        Some(json) => serde_json::from_str(&json).map_err(|e| {
            StoreError::Serialization(format!("legacy document {}: {}", key, e))
        }),
        None => Ok(Vec::new()),
    }
}

async fn import_products(backend: &dyn Backend, source: &dyn LegacySource, now: i64) -> Result<usize> {
    let products: Vec<LegacyProduct> = read_document(source, LEGACY_PRODUCTS).await?;

    for product in &products {
        backend
            .execute(
                r#"
                INSERT OR REPLACE INTO products
                    (id, name, price, barcode, category, stock, image, description, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                &params![
                    &product.id,
                    &product.name,
                    product.price,
                    &product.barcode,
                    product.category.clone().unwrap_or_default(),
                    product.stock.unwrap_or(0),
                    product.image.clone(),
                    product.description.clone(),
                    product.created_at.as_ref().and_then(LegacyTimestamp::millis).unwrap_or(now)
                ],
            )
            .await?;
    }

    Ok(products.len())
}

async fn import_scan_history(
    backend: &dyn Backend,
    source: &dyn LegacySource,
    now: i64,
) -> Result<usize> {
    let entries: Vec<LegacyScan> = read_document(source, LEGACY_SCAN_HISTORY).await?;

    for entry in &entries {
        // Unknown legacy types degrade to plain text
        let kind = entry
            .kind
            .as_deref()
            .and_then(|k| k.parse::<ScanKind>().ok())
            .unwrap_or(ScanKind::Text);

        backend
            .execute(
                "INSERT OR REPLACE INTO scan_history (id, content, type, timestamp) VALUES (?, ?, ?, ?)",
                &params![
                    &entry.id,
                    &entry.content,
                    kind.as_str(),
                    entry.timestamp.as_ref().and_then(LegacyTimestamp::millis).unwrap_or(now)
                ],
            )
            .await?;
    }

    Ok(entries.len())
}

async fn import_sales(backend: &dyn Backend, source: &dyn LegacySource, now: i64) -> Result<usize> {
    let sales: Vec<LegacySale> = read_document(source, LEGACY_SALES).await?;

    for sale in &sales {
        let items: Vec<CartLine> = sale.items.iter().map(LegacyCartLine::to_line).collect();
        let items_json = serde_json::to_string(&items)?;
        let payment_method = sale
            .payment_method
            .as_deref()
            .and_then(|m| m.parse::<PaymentMethod>().ok())
            .unwrap_or(PaymentMethod::Cash);
        let total = sale
            .total
            .unwrap_or_else(|| items.iter().map(CartLine::subtotal).sum());

        backend
            .execute(
                r#"
                INSERT OR REPLACE INTO sales
                    (id, items, total, payment_method, cash_amount, change_amount, timestamp)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                &params![
                    &sale.id,
                    items_json,
                    total,
                    payment_method.as_str(),
                    sale.cash_amount,
                    sale.change,
                    sale.timestamp.as_ref().and_then(LegacyTimestamp::millis).unwrap_or(now)
                ],
            )
            .await?;
    }

    Ok(sales.len())
}

// ============================================================================
// Legacy document shapes (ids were numbers in older builds, dates ISO strings)
// ============================================================================

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyTimestamp {
    Millis(i64),
    Iso(String),
}

impl LegacyTimestamp {
    fn millis(&self) -> Option<i64> {
        match self {
            LegacyTimestamp::Millis(ms) => Some(*ms),
            LegacyTimestamp::Iso(s) => chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp_millis()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyProduct {
    #[serde(deserialize_with = "id_string")]
    id: String,
    name: String,
    price: f64,
    barcode: String,
    category: Option<String>,
    stock: Option<i64>,
    image: Option<String>,
    description: Option<String>,
    created_at: Option<LegacyTimestamp>,
}

#[derive(Debug, Deserialize)]
struct LegacyScan {
    #[serde(deserialize_with = "id_string")]
    id: String,
    content: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    timestamp: Option<LegacyTimestamp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCartLine {
    #[serde(deserialize_with = "id_string")]
    id: String,
    name: String,
    price: f64,
    quantity: i64,
    #[serde(default)]
    barcode: String,
    image: Option<String>,
}

impl LegacyCartLine {
    fn to_line(&self) -> CartLine {
        CartLine {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            quantity: self.quantity,
            barcode: self.barcode.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySale {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    items: Vec<LegacyCartLine>,
    total: Option<f64>,
    payment_method: Option<String>,
    cash_amount: Option<f64>,
    change: Option<f64>,
    #[serde(alias = "date")]
    timestamp: Option<LegacyTimestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_product_accepts_numeric_id_and_iso_date() {
        let json = r#"[{"id": 7, "name": "Tea", "price": 2.5, "barcode": "123",
                        "createdAt": "2024-01-02T03:04:05Z"}]"#;
        let products: Vec<LegacyProduct> = serde_json::from_str(json).unwrap();

        assert_eq!(products[0].id, "7");
        assert_eq!(
            products[0].created_at.as_ref().and_then(LegacyTimestamp::millis),
            Some(1_704_164_645_000)
        );
    }

    #[test]
    fn test_legacy_sale_items_convert_to_lines() {
        let json = r#"{"id": "s1", "items": [{"id": 3, "name": "Cola", "price": 1.5,
                        "quantity": 2}], "paymentMethod": "card", "timestamp": 99}"#;
        let sale: LegacySale = serde_json::from_str(json).unwrap();
        let lines: Vec<CartLine> = sale.items.iter().map(LegacyCartLine::to_line).collect();

        assert_eq!(lines[0].id, "3");
        assert_eq!(lines[0].barcode, "");
        assert_eq!(lines[0].subtotal(), 3.0);
    }
}
