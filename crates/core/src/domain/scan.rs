// Scan History & QR Code Domain Models

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Classification of scanned content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    Url,
    Wifi,
    Email,
    Barcode,
    Text,
}

impl ScanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanKind::Url => "url",
            ScanKind::Wifi => "wifi",
            ScanKind::Email => "email",
            ScanKind::Barcode => "barcode",
            ScanKind::Text => "text",
        }
    }
}

impl std::fmt::Display for ScanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url" => Ok(ScanKind::Url),
            "wifi" => Ok(ScanKind::Wifi),
            "email" => Ok(ScanKind::Email),
            "barcode" => Ok(ScanKind::Barcode),
            "text" => Ok(ScanKind::Text),
            other => Err(DomainError::UnknownScanKind(other.to_string())),
        }
    }
}

/// Append/delete-only record of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanHistoryEntry {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ScanKind,
    pub timestamp: i64, // epoch ms
}

/// Generated/saved QR code. Kept in its own table; `kind` is free-form
/// because generated codes use a wider vocabulary (sms, vcard, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrCodeRecord {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: i64, // epoch ms
    #[serde(default)]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_kind_round_trips_through_str() {
        for kind in [
            ScanKind::Url,
            ScanKind::Wifi,
            ScanKind::Email,
            ScanKind::Barcode,
            ScanKind::Text,
        ] {
            assert_eq!(kind.as_str().parse::<ScanKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_scan_kind() {
        let err = "fax".parse::<ScanKind>().unwrap_err();
        assert_eq!(err, DomainError::UnknownScanKind("fax".to_string()));
        assert!(err.is_decoding());
    }
}
