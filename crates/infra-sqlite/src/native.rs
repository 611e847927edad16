// Native Backend - named, versioned file connections
//
// `NativeConnections` stands in for the host connection provider: a
// registry of named connections that refuses to create a name twice and
// refuses to open an already open handle. The factory tolerates both.

use crate::codec::{bind_params, decode_row};
use crate::connection::create_pool;
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use qrmaster_core::error::{Result, StoreError};
use qrmaster_core::port::{Backend, BackendKind, Row, SqlValue};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum NativeConnectionError {
    #[error("Connection {0} already exists")]
    AlreadyExists(String),

    #[error("Connection {0} does not exist")]
    NotFound(String),

    #[error("Connection {0} is already open")]
    AlreadyOpen(String),

    #[error("Connection {0} is not open")]
    NotOpen(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<NativeConnectionError> for StoreError {
    fn from(err: NativeConnectionError) -> Self {
        match err {
            NativeConnectionError::Store(e) => e,
            other => StoreError::BackendUnavailable(other.to_string()),
        }
    }
}

/// One named database file
pub struct NativeConnection {
    name: String,
    version: i64,
    path: PathBuf,
    pool: tokio::sync::Mutex<Option<SqlitePool>>,
}

impl NativeConnection {
    fn new(name: &str, version: i64, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            version,
            path,
            pool: tokio::sync::Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file and stamp its version. Fails if already open.
    pub async fn open(&self) -> std::result::Result<(), NativeConnectionError> {
        let mut pool = self.pool.lock().await;
        if pool.is_some() {
            return Err(NativeConnectionError::AlreadyOpen(self.name.clone()));
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::from)?;
        }
        let opened = create_pool(&self.path).await?;
        sqlx::query(&format!("PRAGMA user_version = {}", self.version))
            .execute(&opened)
            .await
            .map_err(map_sqlx_error)?;

        info!(name = %self.name, path = %self.path.display(), version = self.version, "Native connection opened");
        *pool = Some(opened);
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.pool.lock().await.is_some()
    }

    async fn pool(&self) -> std::result::Result<SqlitePool, NativeConnectionError> {
        self.pool
            .lock()
            .await
            .clone()
            .ok_or_else(|| NativeConnectionError::NotOpen(self.name.clone()))
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            pool.close().await;
            debug!(name = %self.name, "Native connection closed");
        }
    }
}

/// Registry of named connections rooted at one data directory
#[derive(Clone)]
pub struct NativeConnections {
    data_dir: PathBuf,
    connections: Arc<Mutex<HashMap<String, Arc<NativeConnection>>>>,
}

impl NativeConnections {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            connections: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a new connection. Fails if `name` is already registered.
    pub fn create_connection(
        &self,
        name: &str,
        version: i64,
    ) -> std::result::Result<Arc<NativeConnection>, NativeConnectionError> {
        let mut connections = self.connections.lock().unwrap_or_else(PoisonError::into_inner);
        if connections.contains_key(name) {
            return Err(NativeConnectionError::AlreadyExists(name.to_string()));
        }

        let connection = Arc::new(NativeConnection::new(name, version, self.data_dir.join(name)));
        connections.insert(name.to_string(), Arc::clone(&connection));
        Ok(connection)
    }

    pub fn retrieve_connection(
        &self,
        name: &str,
    ) -> std::result::Result<Arc<NativeConnection>, NativeConnectionError> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| NativeConnectionError::NotFound(name.to_string()))
    }

    /// Close and forget the named connection
    pub async fn close_connection(&self, name: &str) {
        let removed = self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        if let Some(connection) = removed {
            connection.close().await;
        }
    }

    /// Create the named connection, or reuse the registered one, and make
    /// sure it is open
    pub async fn open_or_create(&self, name: &str, version: i64) -> Result<Arc<NativeConnection>> {
        let connection = match self.create_connection(name, version) {
            Ok(connection) => connection,
            Err(NativeConnectionError::AlreadyExists(_)) => {
                debug!(name, "Connection already registered, retrieving it");
                self.retrieve_connection(name)?
            }
            Err(e) => return Err(e.into()),
        };

        match connection.open().await {
            Ok(()) => {}
            Err(NativeConnectionError::AlreadyOpen(_)) => {
                debug!(name, "Connection already open");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(connection)
    }
}

/// Backend over a native file connection
pub struct NativeBackend {
    connection: Arc<NativeConnection>,
    registry: NativeConnections,
}

impl NativeBackend {
    pub fn new(connection: Arc<NativeConnection>, registry: NativeConnections) -> Self {
        Self {
            connection,
            registry,
        }
    }
}

#[async_trait]
impl Backend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let pool = self.connection.pool().await?;
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let pool = self.connection.pool().await?;
        let result = bind_params(sqlx::query(sql), params)
            .execute(&pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<()> {
        self.registry.close_connection(self.connection.name()).await;
        Ok(())
    }
}
