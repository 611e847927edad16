// QRMaster Core - Domain, Ports & Queue-aware Repositories
// NO engine or filesystem dependencies (Hexagonal Architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::Database;
pub use error::{Result, StoreError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
