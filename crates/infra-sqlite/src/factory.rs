// Backend Factory - one backend per platform, chosen at construction

use crate::config::StoreConfig;
use crate::memory_image::MemoryImageBackend;
use crate::native::{NativeBackend, NativeConnections};
use crate::platform::Platform;
use async_trait::async_trait;
use qrmaster_core::error::Result;
use qrmaster_core::port::{Backend, BackendFactory, DurableStore};
use std::sync::Arc;
use tracing::info;

enum Target {
    Native {
        connections: NativeConnections,
        name: String,
        version: i64,
    },
    MemoryImage {
        store: Arc<dyn DurableStore>,
        key: String,
    },
}

pub struct SqliteBackendFactory {
    target: Target,
}

impl SqliteBackendFactory {
    /// Named, versioned file connection from `connections`
    pub fn native(connections: NativeConnections, name: impl Into<String>, version: i64) -> Self {
        Self {
            target: Target::Native {
                connections,
                name: name.into(),
                version,
            },
        }
    }

    /// In-memory engine mirrored to `store` under `key`
    pub fn memory_image(store: Arc<dyn DurableStore>, key: impl Into<String>) -> Self {
        Self {
            target: Target::MemoryImage {
                store,
                key: key.into(),
            },
        }
    }

    /// Detect the platform from `config` and build the matching factory
    pub fn from_config(config: &StoreConfig, durable_store: Arc<dyn DurableStore>) -> Self {
        let platform = Platform::detect(config.platform);
        info!(%platform, "Backend platform selected");

        match platform {
            Platform::Native => Self::native(
                NativeConnections::new(&config.data_dir),
                &config.database_name,
                config.database_version,
            ),
            Platform::Web => Self::memory_image(durable_store, &config.image_key),
        }
    }

    pub fn platform(&self) -> Platform {
        match self.target {
            Target::Native { .. } => Platform::Native,
            Target::MemoryImage { .. } => Platform::Web,
        }
    }
}

#[async_trait]
impl BackendFactory for SqliteBackendFactory {
    async fn open(&self) -> Result<Arc<dyn Backend>> {
        match &self.target {
            Target::Native {
                connections,
                name,
                version,
            } => {
                let connection = connections.open_or_create(name, *version).await?;
                Ok(Arc::new(NativeBackend::new(connection, connections.clone())))
            }
            Target::MemoryImage { store, key } => {
                let backend = MemoryImageBackend::open(Arc::clone(store), key).await?;
                Ok(Arc::new(backend))
            }
        }
    }
}
