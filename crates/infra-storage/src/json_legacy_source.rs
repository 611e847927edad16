// Legacy JSON documents, one `<key>.json` file per key

use crate::key_file_stem;
use async_trait::async_trait;
use qrmaster_core::error::Result;
use qrmaster_core::port::LegacySource;
use std::path::PathBuf;
use tracing::debug;

pub struct JsonFileLegacySource {
    dir: PathBuf,
}

impl JsonFileLegacySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl LegacySource for JsonFileLegacySource {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.dir.join(format!("{}.json", key_file_stem(key)));
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => {
                debug!(key, path = %path.display(), "Legacy document found");
                Ok(Some(json))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_existing_and_missing_documents() {
        let dir = tempfile::tempdir().unwrap();
        let products = serde_json::json!([{"id": 1, "name": "Tea"}]).to_string();
        std::fs::write(dir.path().join("products.json"), &products).unwrap();

        let source = JsonFileLegacySource::new(dir.path());

        assert_eq!(source.read("products").await.unwrap(), Some(products));
        assert_eq!(source.read("sales").await.unwrap(), None);
    }
}
