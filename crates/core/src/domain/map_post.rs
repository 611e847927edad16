// Map Post Domain Model (social map)

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Photo,
    Music,
    Audio,
    Qr,
    Note,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Photo => "photo",
            PostType::Music => "music",
            PostType::Audio => "audio",
            PostType::Qr => "qr",
            PostType::Note => "note",
        }
    }
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "photo" => Ok(PostType::Photo),
            "music" => Ok(PostType::Music),
            "audio" => Ok(PostType::Audio),
            "qr" => Ok(PostType::Qr),
            "note" => Ok(PostType::Note),
            other => Err(DomainError::UnknownPostType(other.to_string())),
        }
    }
}

/// Payload carried by a post; exactly one variant per post type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "postType", rename_all = "lowercase")]
pub enum PostPayload {
    Photo { photo: String },
    Music { music: String },
    Audio { audio: String },
    Qr {
        #[serde(rename = "qrCode")]
        qr_code: String,
        #[serde(rename = "qrType")]
        qr_type: String,
    },
    Note { note: String },
}

/// Storage columns of a payload; every column not implied by the type is `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadColumns {
    pub photo: Option<String>,
    pub music: Option<String>,
    pub audio: Option<String>,
    pub qr_code: Option<String>,
    pub qr_type: Option<String>,
    pub note: Option<String>,
}

impl PostPayload {
    pub fn post_type(&self) -> PostType {
        match self {
            PostPayload::Photo { .. } => PostType::Photo,
            PostPayload::Music { .. } => PostType::Music,
            PostPayload::Audio { .. } => PostType::Audio,
            PostPayload::Qr { .. } => PostType::Qr,
            PostPayload::Note { .. } => PostType::Note,
        }
    }

    pub fn to_columns(&self) -> PayloadColumns {
        let mut columns = PayloadColumns::default();
        match self {
            PostPayload::Photo { photo } => columns.photo = Some(photo.clone()),
            PostPayload::Music { music } => columns.music = Some(music.clone()),
            PostPayload::Audio { audio } => columns.audio = Some(audio.clone()),
            PostPayload::Qr { qr_code, qr_type } => {
                columns.qr_code = Some(qr_code.clone());
                columns.qr_type = Some(qr_type.clone());
            }
            PostPayload::Note { note } => columns.note = Some(note.clone()),
        }
        columns
    }

    /// Rebuild from stored columns, ignoring columns the type does not use
    pub fn from_columns(post_type: PostType, columns: PayloadColumns) -> Result<Self> {
        fn required(
            value: Option<String>,
            post_type: PostType,
            field: &'static str,
        ) -> Result<String> {
            value.ok_or(DomainError::MissingPayload {
                post_type: post_type.as_str(),
                field,
            })
        }

        Ok(match post_type {
            PostType::Photo => PostPayload::Photo {
                photo: required(columns.photo, post_type, "photo")?,
            },
            PostType::Music => PostPayload::Music {
                music: required(columns.music, post_type, "music")?,
            },
            PostType::Audio => PostPayload::Audio {
                audio: required(columns.audio, post_type, "audio")?,
            },
            PostType::Qr => PostPayload::Qr {
                qr_code: required(columns.qr_code, post_type, "qrCode")?,
                qr_type: required(columns.qr_type, post_type, "qrType")?,
            },
            PostType::Note => PostPayload::Note {
                note: required(columns.note, post_type, "note")?,
            },
        })
    }
}

/// Geotagged post on the social map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPost {
    pub id: String,
    #[serde(flatten)]
    pub payload: PostPayload,
    pub caption: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64, // epoch ms
    pub user_name: String,
}

impl MapPost {
    pub fn post_type(&self) -> PostType {
        self.payload.post_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_payload_sets_only_qr_columns() {
        let payload = PostPayload::Qr {
            qr_code: "https://example.com".to_string(),
            qr_type: "url".to_string(),
        };
        let columns = payload.to_columns();

        assert_eq!(columns.qr_code.as_deref(), Some("https://example.com"));
        assert_eq!(columns.qr_type.as_deref(), Some("url"));
        assert!(columns.photo.is_none());
        assert!(columns.music.is_none());
        assert!(columns.audio.is_none());
        assert!(columns.note.is_none());
    }

    #[test]
    fn test_from_columns_ignores_foreign_fields() {
        let columns = PayloadColumns {
            note: Some("hello".to_string()),
            photo: Some("stale".to_string()),
            ..Default::default()
        };
        let payload = PostPayload::from_columns(PostType::Note, columns).unwrap();
        assert_eq!(
            payload,
            PostPayload::Note {
                note: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_from_columns_missing_payload() {
        let err = PostPayload::from_columns(PostType::Photo, PayloadColumns::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::MissingPayload { field: "photo", .. }
        ));
    }

    #[test]
    fn test_map_post_json_shape() {
        let post = MapPost {
            id: "m1".to_string(),
            payload: PostPayload::Music {
                music: "song.mp3".to_string(),
            },
            caption: "tune".to_string(),
            latitude: 41.0,
            longitude: 29.0,
            timestamp: 10,
            user_name: "ayse".to_string(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["postType"], "music");
        assert_eq!(json["music"], "song.mp3");
        assert_eq!(json["userName"], "ayse");
    }
}
