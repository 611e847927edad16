// Map Post Repository

use crate::application::Database;
use crate::domain::map_post::PayloadColumns;
use crate::domain::{MapPost, PostPayload, PostType};
use crate::error::Result;
use crate::params;
use crate::port::Row;

pub struct MapPostRepository<'a> {
    db: &'a Database,
}

impl<'a> MapPostRepository<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<MapPost>> {
        let rows = self
            .db
            .query(
                r#"
                SELECT id, post_type, photo, music, audio, qr_code, qr_type, note,
                       caption, latitude, longitude, timestamp, user_name
                FROM map_posts
                ORDER BY timestamp DESC, rowid DESC
                "#,
                &[],
            )
            .await?;
        rows.iter().map(row_to_post).collect()
    }

    /// Store the post; payload columns not implied by its type are NULL
    pub async fn add(&self, post: &MapPost) -> Result<()> {
        let columns = post.payload.to_columns();

        self.db
            .execute(
                r#"
                INSERT INTO map_posts
                    (id, post_type, photo, music, audio, qr_code, qr_type, note,
                     caption, latitude, longitude, timestamp, user_name)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                &params![
                    &post.id,
                    post.post_type().as_str(),
                    columns.photo,
                    columns.music,
                    columns.audio,
                    columns.qr_code,
                    columns.qr_type,
                    columns.note,
                    &post.caption,
                    post.latitude,
                    post.longitude,
                    post.timestamp,
                    &post.user_name
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<u64> {
        self.db
            .execute("DELETE FROM map_posts WHERE id = ?", &params![id])
            .await
    }
}

fn row_to_post(row: &Row) -> Result<MapPost> {
    let post_type = row.text("post_type")?.parse::<PostType>()?;
    let columns = PayloadColumns {
        photo: row.opt_text("photo")?,
        music: row.opt_text("music")?,
        audio: row.opt_text("audio")?,
        qr_code: row.opt_text("qr_code")?,
        qr_type: row.opt_text("qr_type")?,
        note: row.opt_text("note")?,
    };

    Ok(MapPost {
        id: row.text("id")?,
        payload: PostPayload::from_columns(post_type, columns)?,
        caption: row.opt_text("caption")?.unwrap_or_default(),
        latitude: row.real("latitude")?,
        longitude: row.real("longitude")?,
        timestamp: row.integer("timestamp")?,
        user_name: row.opt_text("user_name")?.unwrap_or_default(),
    })
}
