// In-memory Image Backend
//
// A private in-memory engine whose full database image is serialized after
// every mutating statement and handed to the durable store bridge. The
// image is the SQLite file format of the main schema, so hydration is a
// plain deserialize into a fresh engine.

use crate::bridge::DurableStoreBridge;
use crate::codec::{bind_params, decode_row};
use crate::connection::open_memory_connection;
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use qrmaster_core::error::{Result, StoreError};
use qrmaster_core::port::{Backend, BackendKind, DurableStore, Row, SqlValue};
use sqlx::sqlite::{SqliteConnection, SqliteOwnedBuf};
use sqlx::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct MemoryImageBackend {
    conn: Mutex<Option<SqliteConnection>>,
    bridge: DurableStoreBridge,
}

impl MemoryImageBackend {
    /// Start an engine, hydrated from the image under `key` when one exists
    /// and is readable, empty otherwise
    pub async fn open(store: Arc<dyn DurableStore>, key: &str) -> Result<Self> {
        let conn = match store.load(key).await {
            Ok(Some(image)) => match hydrate(&image).await {
                Ok(conn) => {
                    info!(key, bytes = image.len(), "In-memory engine hydrated from durable image");
                    conn
                }
                Err(e) => {
                    warn!(key, error = %e, "Durable image unreadable, starting empty");
                    open_memory_connection().await?
                }
            },
            Ok(None) => {
                info!(key, "No durable image, starting empty");
                open_memory_connection().await?
            }
            Err(e) => {
                warn!(key, error = %e, "Durable image could not be loaded, starting empty");
                open_memory_connection().await?
            }
        };

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            bridge: DurableStoreBridge::spawn(store, key),
        })
    }

    /// Wait for queued durable writes
    pub async fn flush(&self) {
        self.bridge.flush().await;
    }

    /// Current full image, as it would be persisted
    pub async fn export(&self) -> Result<Vec<u8>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(closed)?;
        export_image(conn).await
    }
}

fn closed() -> StoreError {
    StoreError::BackendUnavailable("in-memory engine is closed".to_string())
}

#[async_trait]
impl Backend for MemoryImageBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MemoryImage
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(closed)?;

        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(closed)?;

        let affected = bind_params(sqlx::query(sql), params)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        // The statement is committed in memory; a failed export only leaves
        // the durable copy behind
        match export_image(conn).await {
            Ok(image) => self.bridge.persist(image),
            Err(e) => warn!(error = %e, "Image export failed, durable copy is stale"),
        }

        Ok(affected)
    }

    async fn close(&self) -> Result<()> {
        let conn = self.conn.lock().await.take();
        self.bridge.flush().await;

        if let Some(conn) = conn {
            conn.close().await.map_err(map_sqlx_error)?;
            debug!(key = %self.bridge.key(), "In-memory engine closed");
        }
        Ok(())
    }
}

/// Serialize the main schema into SQLite file format
async fn export_image(conn: &mut SqliteConnection) -> Result<Vec<u8>> {
    let image = conn.serialize(None).await.map_err(map_sqlx_error)?;
    Ok(image.to_vec())
}

/// Build a fresh engine holding the contents of `image`
async fn hydrate(image: &[u8]) -> Result<SqliteConnection> {
    let buf = SqliteOwnedBuf::try_from(image).map_err(map_sqlx_error)?;

    let mut conn = open_memory_connection().await?;
    conn.deserialize(None, buf, false)
        .await
        .map_err(map_sqlx_error)?;

    // Deserialize does not inspect the bytes; the first read does
    let tables: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(&mut conn)
            .await
            .map_err(map_sqlx_error)?;
    debug!(tables, "Image deserialized");

    Ok(conn)
}
