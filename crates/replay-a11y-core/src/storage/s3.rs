//! S3-compatible segment storage (AWS S3, MinIO, Garage, R2).

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{
    decompress_segment, settle_download, StorageError, StorageProvider, StorageSettings,
};
use crate::telemetry::Reporter;

pub struct S3StorageProvider {
    client: Client,
    bucket: String,
    reporter: Arc<dyn Reporter>,
}

impl S3StorageProvider {
    /// Build a client from explicit settings, falling back to the default AWS
    /// provider chain for anything left unset.
    pub async fn connect(settings: &StorageSettings, reporter: Arc<dyn Reporter>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.s3_region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(access_key), Some(secret_key)) =
            (&settings.s3_access_key_id, &settings.s3_secret_access_key)
        {
            let credentials =
                Credentials::new(access_key, secret_key, None, None, "replay-a11y-settings");
            loader = loader.credentials_provider(credentials);
        }
        if let Some(timeout) = settings.timeout {
            loader = loader.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            );
        }
        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.s3_force_path_style)
            .build();
        debug!(
            bucket = %settings.bucket,
            endpoint = ?settings.s3_endpoint,
            path_style = settings.s3_force_path_style,
            "built S3 client"
        );
        Self::from_client(Client::from_conf(s3_config), &settings.bucket, reporter)
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client, bucket: &str, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            reporter,
        }
    }

    async fn fetch(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|err| {
                let missing = err
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key());
                if missing {
                    StorageError::NotFound {
                        bucket: self.bucket.clone(),
                        name: name.to_string(),
                    }
                } else {
                    StorageError::Fetch {
                        bucket: self.bucket.clone(),
                        name: name.to_string(),
                        message: DisplayErrorContext(&err).to_string(),
                    }
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| StorageError::Fetch {
                bucket: self.bucket.clone(),
                name: name.to_string(),
                message: format!("failed to read object body: {err}"),
            })?;
        Ok(body.into_bytes().to_vec())
    }
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    async fn download_from_filename(&self, filename: &str) -> String {
        let outcome = match self.fetch(filename).await {
            Ok(bytes) => decompress_segment(&bytes),
            Err(err) => Err(err),
        };
        settle_download(outcome, filename, &self.bucket, self.reporter.as_ref())
    }
}
