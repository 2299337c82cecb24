use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{decompress_segment, settle_download, StorageError, StorageProvider};
use crate::telemetry::Reporter;

/// In-process object store keyed by `(bucket, name)`.
///
/// Objects are stored exactly as the real backends hold them (compressed), so
/// decompression and the placeholder policy are exercised end to end.
pub struct MemoryStorageProvider {
    bucket: String,
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    reporter: Arc<dyn Reporter>,
}

impl MemoryStorageProvider {
    pub fn new(bucket: impl Into<String>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
            reporter,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Store raw (already compressed) bytes under `name` in `bucket`.
    pub fn save(&self, bucket: &str, name: &str, bytes: impl Into<Vec<u8>>) {
        let mut objects = self
            .objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        objects.insert((bucket.to_string(), name.to_string()), bytes.into());
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self
            .objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        objects
            .get(&(self.bucket.clone(), name.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: self.bucket.clone(),
                name: name.to_string(),
            })
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    async fn download_from_filename(&self, filename: &str) -> String {
        let outcome = self
            .fetch(filename)
            .and_then(|bytes| decompress_segment(&bytes));
        settle_download(outcome, filename, &self.bucket, self.reporter.as_ref())
    }
}
