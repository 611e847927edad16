// Application Layer - Store lifecycle, schema and repositories

pub mod database;
pub mod migration;
pub mod repository;
pub mod schema;

// Re-exports
pub use database::{Database, DatabaseBuilder};
pub use migration::MigrationOutcome;
pub use repository::{
    CartRepository, MapPostRepository, ProductRepository, QrCodeRepository,
    SalesRepository, ScanHistoryRepository, SettingsRepository,
};
