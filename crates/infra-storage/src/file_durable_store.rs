// File-backed Durable Store
// One blob per key, replaced atomically (temp file + rename)

use crate::key_file_stem;
use async_trait::async_trait;
use qrmaster_core::error::{Result, StoreError};
use qrmaster_core::port::DurableStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FileDurableStore {
    dir: PathBuf,
}

impl FileDurableStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(StoreError::Validation("durable store key is empty".to_string()));
        }
        Ok(self.dir.join(format!("{}.bin", key_file_stem(key))))
    }
}

fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl DurableStore for FileDurableStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Persistence(format!(
                "read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let dir = self.dir.clone();
        let target = path.clone();
        let data = bytes.to_vec();

        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &data))
            .await
            .map_err(|e| StoreError::Persistence(format!("writer task failed: {}", e)))?
            .map_err(|e| StoreError::Persistence(format!("write {}: {}", path.display(), e)))?;

        debug!(key, bytes = bytes.len(), "Blob saved");
        Ok(())
    }
}
