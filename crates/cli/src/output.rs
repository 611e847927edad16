//! Table rows for terminal output

use qrmaster_core::domain::{
    CartLine, MapPost, PostPayload, Product, QrCodeRecord, Sale, ScanHistoryEntry, SettingEntry,
};
use tabled::Tabled;

/// Local `YYYY-MM-DD HH:MM`, raw millis if out of range
pub fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| millis.to_string())
}

#[derive(Tabled)]
pub struct ProductRow {
    id: String,
    name: String,
    price: String,
    barcode: String,
    category: String,
    stock: i64,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            price: format!("{:.2}", p.price),
            barcode: p.barcode.clone(),
            category: p.category.clone(),
            stock: p.stock,
        }
    }
}

#[derive(Tabled)]
pub struct CartRow {
    id: String,
    name: String,
    price: String,
    quantity: i64,
    subtotal: String,
}

impl From<&CartLine> for CartRow {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            price: format!("{:.2}", line.price),
            quantity: line.quantity,
            subtotal: format!("{:.2}", line.subtotal()),
        }
    }
}

#[derive(Tabled)]
pub struct ScanRow {
    id: String,
    #[tabled(rename = "type")]
    kind: String,
    content: String,
    time: String,
}

impl From<&ScanHistoryEntry> for ScanRow {
    fn from(entry: &ScanHistoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            kind: entry.kind.to_string(),
            content: entry.content.clone(),
            time: format_millis(entry.timestamp),
        }
    }
}

impl From<&QrCodeRecord> for ScanRow {
    fn from(record: &QrCodeRecord) -> Self {
        Self {
            id: record.id.clone(),
            kind: record.kind.clone(),
            content: record.content.clone(),
            time: format_millis(record.timestamp),
        }
    }
}

#[derive(Tabled)]
pub struct SaleRow {
    id: String,
    items: usize,
    total: String,
    payment: String,
    change: String,
    time: String,
}

impl From<&Sale> for SaleRow {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id.clone(),
            items: sale.items.iter().map(|l| l.quantity as usize).sum(),
            total: format!("{:.2}", sale.total),
            payment: sale.payment_method.to_string(),
            change: sale.change.map(|c| format!("{:.2}", c)).unwrap_or_default(),
            time: format_millis(sale.timestamp),
        }
    }
}

#[derive(Tabled)]
pub struct PostRow {
    id: String,
    #[tabled(rename = "type")]
    kind: String,
    payload: String,
    caption: String,
    location: String,
    user: String,
}

impl From<&MapPost> for PostRow {
    fn from(post: &MapPost) -> Self {
        let payload = match &post.payload {
            PostPayload::Photo { photo } => photo.clone(),
            PostPayload::Music { music } => music.clone(),
            PostPayload::Audio { audio } => audio.clone(),
            PostPayload::Qr { qr_code, qr_type } => format!("{} ({})", qr_code, qr_type),
            PostPayload::Note { note } => note.clone(),
        };
        Self {
            id: post.id.clone(),
            kind: post.post_type().to_string(),
            payload,
            caption: post.caption.clone(),
            location: format!("{:.5}, {:.5}", post.latitude, post.longitude),
            user: post.user_name.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct SettingRow {
    key: String,
    value: String,
}

impl From<&SettingEntry> for SettingRow {
    fn from(entry: &SettingEntry) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.clone(),
        }
    }
}
