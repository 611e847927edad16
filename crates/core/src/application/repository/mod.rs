// Domain Repositories
//
// Thin, backend-agnostic wrappers over the queue-aware `Database::query` and
// `Database::execute`. Missing rows are never errors: lookups return
// `Option`, updates and deletes return the affected row count.

mod cart;
mod map_post;
mod product;
mod sales;
mod scan;
mod settings;

pub use cart::CartRepository;
pub use map_post::MapPostRepository;
pub use product::ProductRepository;
pub use sales::{SalesRepository, DEFAULT_SALES_LIMIT};
pub use scan::{QrCodeRepository, ScanHistoryRepository};
pub use settings::SettingsRepository;

/// SQLite treats a negative LIMIT as "no limit"
fn limit_param(limit: Option<u32>) -> i64 {
    limit.map(i64::from).unwrap_or(-1)
}
