// Scan History & QR Code Repositories

use super::limit_param;
use crate::application::Database;
use crate::domain::{QrCodeRecord, ScanHistoryEntry, ScanKind};
use crate::error::Result;
use crate::params;
use crate::port::Row;

pub struct ScanHistoryRepository<'a> {
    db: &'a Database,
}

impl<'a> ScanHistoryRepository<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Newest first, optionally capped at `limit` entries
    pub async fn list(&self, limit: Option<u32>) -> Result<Vec<ScanHistoryEntry>> {
        let rows = self
            .db
            .query(
                r#"
                SELECT id, content, type, timestamp FROM scan_history
                ORDER BY timestamp DESC, rowid DESC
                LIMIT ?
                "#,
                &params![limit_param(limit)],
            )
            .await?;
        rows.iter().map(row_to_scan).collect()
    }

    pub async fn add(&self, entry: &ScanHistoryEntry) -> Result<()> {
        self.db
            .execute(
                "INSERT INTO scan_history (id, content, type, timestamp) VALUES (?, ?, ?, ?)",
                &params![&entry.id, &entry.content, entry.kind.as_str(), entry.timestamp],
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<u64> {
        self.db
            .execute("DELETE FROM scan_history WHERE id = ?", &params![id])
            .await
    }

    pub async fn clear(&self) -> Result<u64> {
        self.db.execute("DELETE FROM scan_history", &[]).await
    }
}

fn row_to_scan(row: &Row) -> Result<ScanHistoryEntry> {
    Ok(ScanHistoryEntry {
        id: row.text("id")?,
        content: row.text("content")?,
        kind: row.text("type")?.parse::<ScanKind>()?,
        timestamp: row.integer("timestamp")?,
    })
}

pub struct QrCodeRepository<'a> {
    db: &'a Database,
}

impl<'a> QrCodeRepository<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Newest first, optionally capped at `limit` records
    pub async fn list(&self, limit: Option<u32>) -> Result<Vec<QrCodeRecord>> {
        let rows = self
            .db
            .query(
                r#"
                SELECT id, content, type, timestamp, image FROM qrcodes
                ORDER BY timestamp DESC, rowid DESC
                LIMIT ?
                "#,
                &params![limit_param(limit)],
            )
            .await?;
        rows.iter().map(row_to_qr_code).collect()
    }

    /// Newest first, restricted to one type
    pub async fn list_by_type(&self, kind: &str) -> Result<Vec<QrCodeRecord>> {
        let rows = self
            .db
            .query(
                r#"
                SELECT id, content, type, timestamp, image FROM qrcodes
                WHERE type = ?
                ORDER BY timestamp DESC, rowid DESC
                "#,
                &params![kind],
            )
            .await?;
        rows.iter().map(row_to_qr_code).collect()
    }

    pub async fn add(&self, record: &QrCodeRecord) -> Result<()> {
        self.db
            .execute(
                "INSERT INTO qrcodes (id, content, type, timestamp, image) VALUES (?, ?, ?, ?, ?)",
                &params![
                    &record.id,
                    &record.content,
                    &record.kind,
                    record.timestamp,
                    record.image.clone()
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<u64> {
        self.db
            .execute("DELETE FROM qrcodes WHERE id = ?", &params![id])
            .await
    }

    pub async fn clear(&self) -> Result<u64> {
        self.db.execute("DELETE FROM qrcodes", &[]).await
    }
}

fn row_to_qr_code(row: &Row) -> Result<QrCodeRecord> {
    Ok(QrCodeRecord {
        id: row.text("id")?,
        content: row.text("content")?,
        kind: row.text("type")?,
        timestamp: row.integer("timestamp")?,
        image: row.opt_text("image")?,
    })
}
