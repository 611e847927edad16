// Port Layer - Interfaces for external dependencies

pub mod backend;
pub mod durable_store;
pub mod id_provider; // For deterministic testing
pub mod legacy_source;
pub mod time_provider;

// Re-exports
pub use backend::{Backend, BackendFactory, BackendKind, Row, SqlValue};
pub use durable_store::DurableStore;
pub use id_provider::IdProvider;
pub use legacy_source::LegacySource;
pub use time_provider::TimeProvider;
