// Legacy Data Source Port (pre-SQLite key/value documents)
use crate::error::Result;
use async_trait::async_trait;

/// Legacy document keys imported once into the store
pub const LEGACY_PRODUCTS: &str = "products";
pub const LEGACY_SCAN_HISTORY: &str = "scanHistory";
pub const LEGACY_SALES: &str = "sales";

/// Read-only access to JSON documents written by the pre-SQLite app
#[async_trait]
pub trait LegacySource: Send + Sync {
    /// Raw JSON document stored under `key`, `None` if absent
    async fn read(&self, key: &str) -> Result<Option<String>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory legacy documents
    #[derive(Default)]
    pub struct MemoryLegacySource {
        documents: Mutex<HashMap<String, String>>,
        reads: AtomicUsize,
    }

    impl MemoryLegacySource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, key: &str, json: impl Into<String>) {
            self.documents
                .lock()
                .unwrap()
                .insert(key.to_string(), json.into());
        }

        /// Number of `read` calls served
        pub fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LegacySource for MemoryLegacySource {
        async fn read(&self, key: &str) -> Result<Option<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.documents.lock().unwrap().get(key).cloned())
        }
    }
}
