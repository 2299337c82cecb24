use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::{
    decompress_segment, settle_download, StorageError, StorageProvider, StorageSettings,
};
use crate::telemetry::Reporter;

/// Bucket-object backend speaking the Cloud Storage JSON API (`alt=media` downloads).
#[derive(Clone)]
pub struct GcsStorageProvider {
    http: Client,
    endpoint: Url,
    bucket: String,
    access_token: Option<String>,
    reporter: Arc<dyn Reporter>,
}

impl GcsStorageProvider {
    pub fn new(settings: &StorageSettings, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let endpoint = Url::parse(&settings.gcs_endpoint)
            .with_context(|| format!("invalid bucket endpoint `{}`", settings.gcs_endpoint))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("bucket endpoint `{}` cannot carry a path", endpoint);
        }
        let http = Client::builder()
            .user_agent("replay-a11y/0.1")
            .timeout(settings.timeout.unwrap_or(Duration::from_secs(30)))
            .build()
            .map_err(|err| StorageError::Client(err.to_string()))?;
        Ok(Self::with_client(http, endpoint, settings, reporter))
    }

    /// Reuse an existing HTTP client, e.g. one shared with other components.
    pub fn with_client(
        http: Client,
        endpoint: Url,
        settings: &StorageSettings,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            http,
            endpoint,
            bucket: settings.bucket.clone(),
            access_token: settings.gcs_access_token.clone(),
            reporter,
        }
    }

    fn object_url(&self, name: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "b", self.bucket.as_str(), "o", name]);
        }
        url.query_pairs_mut().append_pair("alt", "media");
        url
    }

    async fn fetch(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let fetch_error = |message: String| StorageError::Fetch {
            bucket: self.bucket.clone(),
            name: name.to_string(),
            message,
        };

        let mut request = self.http.get(self.object_url(name));
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|err| fetch_error(err.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(StorageError::NotFound {
                    bucket: self.bucket.clone(),
                    name: name.to_string(),
                })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(fetch_error(format!("storage API error ({status}): {body}")));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| fetch_error(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl StorageProvider for GcsStorageProvider {
    async fn download_from_filename(&self, filename: &str) -> String {
        let outcome = match self.fetch(filename).await {
            Ok(bytes) => decompress_segment(&bytes),
            Err(err) => Err(err),
        };
        settle_download(outcome, filename, &self.bucket, self.reporter.as_ref())
    }
}
