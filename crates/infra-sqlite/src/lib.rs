// QRMaster Infrastructure - SQLite Backends
// Implements: Backend (native file, in-memory image), BackendFactory

mod bridge;
mod codec;
mod config;
mod connection;
mod error;
mod factory;
mod memory_image;
mod native;
mod platform;

pub use bridge::DurableStoreBridge;
pub use config::{StoreConfig, DEFAULT_DATABASE_NAME, DEFAULT_DATABASE_VERSION, DEFAULT_IMAGE_KEY};
pub use connection::{create_pool, open_memory_connection};
pub use factory::SqliteBackendFactory;
pub use memory_image::MemoryImageBackend;
pub use native::{NativeBackend, NativeConnection, NativeConnectionError, NativeConnections};
pub use platform::{Platform, PlatformPreference};

// Note: sqlx::Error conversion is handled by a helper function
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for StoreError here)
