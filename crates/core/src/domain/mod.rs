// Domain Layer - Entities persisted by the local store

pub mod cart;
pub mod error;
pub mod map_post;
pub mod product;
pub mod sale;
pub mod scan;
pub mod setting;

// Re-exports
pub use cart::CartLine;
pub use error::DomainError;
pub use map_post::{MapPost, PostPayload, PostType};
pub use product::{Product, ProductPatch};
pub use sale::{PaymentMethod, Sale};
pub use scan::{QrCodeRecord, ScanHistoryEntry, ScanKind};
pub use setting::SettingEntry;
