use std::io::Read;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flate2::read::{MultiGzDecoder, ZlibDecoder};
use futures::future::join_all;
use thiserror::Error;
use tracing::warn;

use crate::telemetry::Reporter;

pub mod gcs;
pub mod memory;
pub mod s3;
mod settings;

pub use gcs::GcsStorageProvider;
pub use memory::MemoryStorageProvider;
pub use s3::S3StorageProvider;
pub use settings::{ProviderKind, StorageSettings};

/// Text substituted for any segment that could not be fetched or decoded.
pub const PLACEHOLDER_SEGMENT: &str = "[]";

/// Retrieval of compressed session segments from an object store.
///
/// Both methods are total: a failing object is reported and replaced by
/// [`PLACEHOLDER_SEGMENT`], never returned as an error.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Fetch and decompress a single segment.
    async fn download_from_filename(&self, filename: &str) -> String;

    /// Fetch every segment concurrently; output is positionally aligned with `filenames`.
    async fn download_from_filenames(&self, filenames: &[String]) -> Vec<String> {
        join_all(
            filenames
                .iter()
                .map(|filename| self.download_from_filename(filename)),
        )
        .await
    }
}

/// Per-object failure inside a provider. Never crosses the [`StorageProvider`] boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object `{name}` not found in bucket `{bucket}`")]
    NotFound { bucket: String, name: String },
    #[error("failed to fetch `{name}` from bucket `{bucket}`: {message}")]
    Fetch {
        bucket: String,
        name: String,
        message: String,
    },
    #[error("failed to decompress segment: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("segment is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
    #[error("failed to build storage client: {0}")]
    Client(String),
}

/// Inflate a gzip or zlib-wrapped segment and decode it as UTF-8.
pub fn decompress_segment(bytes: &[u8]) -> Result<String, StorageError> {
    let mut inflated = Vec::new();
    if bytes.starts_with(&[0x1f, 0x8b]) {
        MultiGzDecoder::new(bytes)
            .read_to_end(&mut inflated)
            .map_err(StorageError::Decompress)?;
    } else {
        ZlibDecoder::new(bytes)
            .read_to_end(&mut inflated)
            .map_err(StorageError::Decompress)?;
    }
    Ok(String::from_utf8(inflated)?)
}

/// Apply the placeholder policy to one download attempt.
pub(crate) fn settle_download(
    outcome: Result<String, StorageError>,
    filename: &str,
    bucket: &str,
    reporter: &dyn Reporter,
) -> String {
    match outcome {
        Ok(text) => text,
        Err(err) => {
            warn!(file = filename, bucket, error = %err, "error downloading file");
            reporter.capture_error(
                &anyhow::Error::new(err),
                &[
                    ("fileName", filename.to_string()),
                    ("bucketName", bucket.to_string()),
                ],
            );
            PLACEHOLDER_SEGMENT.to_string()
        }
    }
}

/// Build the provider selected by `settings`. Called once at process start.
pub async fn new_storage(
    settings: &StorageSettings,
    reporter: Arc<dyn Reporter>,
) -> Result<Arc<dyn StorageProvider>> {
    let provider: Arc<dyn StorageProvider> = match settings.provider {
        ProviderKind::Gcs => Arc::new(GcsStorageProvider::new(settings, reporter)?),
        ProviderKind::S3 => Arc::new(S3StorageProvider::connect(settings, reporter).await),
        ProviderKind::Memory => Arc::new(MemoryStorageProvider::new(&settings.bucket, reporter)),
    };
    Ok(provider)
}
