// Durable Store Port (browser-durable key/value area analogue)
use crate::error::Result;
use async_trait::async_trait;

/// Persistent byte-blob store that survives process restarts.
///
/// The in-memory backend keeps its whole database image under one key.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read the blob stored under `key`, `None` if absent
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite the blob stored under `key`
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::StoreError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-process durable store with a forced-failure switch for writes
    #[derive(Default)]
    pub struct MemoryDurableStore {
        blobs: Mutex<HashMap<String, Vec<u8>>>,
        fail_saves: AtomicBool,
        saves: AtomicUsize,
    }

    impl MemoryDurableStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-seed a blob (e.g. a corrupt image)
        pub fn with_blob(key: &str, bytes: Vec<u8>) -> Self {
            let store = Self::default();
            store.blobs.lock().unwrap().insert(key.to_string(), bytes);
            store
        }

        /// Make every subsequent `save` fail
        pub fn set_fail_saves(&self, fail: bool) {
            self.fail_saves.store(fail, Ordering::SeqCst);
        }

        /// Number of successful saves
        pub fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        pub fn get(&self, key: &str) -> Option<Vec<u8>> {
            self.blobs.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl DurableStore for MemoryDurableStore {
        async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.get(key))
        }

        async fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Persistence(format!(
                    "forced save failure for key {}",
                    key
                )));
            }
            self.blobs
                .lock()
                .unwrap()
                .insert(key.to_string(), bytes.to_vec());
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
