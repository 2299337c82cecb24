use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Backend variants a [`StorageSettings`] can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gcs,
    S3,
    Memory,
}

impl ProviderKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "gcs" => Some(Self::Gcs),
            "s3" => Some(Self::S3),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Environment-driven configuration for segment storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub provider: ProviderKind,
    pub bucket: String,
    pub gcs_endpoint: String,
    pub gcs_access_token: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_region: Option<String>,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub s3_force_path_style: bool,
    pub timeout: Option<Duration>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gcs,
            bucket: Self::DEFAULT_BUCKET.to_string(),
            gcs_endpoint: Self::DEFAULT_GCS_ENDPOINT.to_string(),
            gcs_access_token: None,
            s3_endpoint: None,
            s3_region: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            s3_force_path_style: false,
            timeout: None,
        }
    }
}

impl StorageSettings {
    pub const PROVIDER_ENV: &'static str = "STORAGE_PROVIDER";
    pub const BUCKET_ENV: &'static str = "BUCKET_NAME";
    pub const GCS_ENDPOINT_ENV: &'static str = "GCS_ENDPOINT";
    pub const GCS_TOKEN_ENV: &'static str = "GCS_ACCESS_TOKEN";
    pub const S3_ENDPOINT_ENV: &'static str = "S3_ENDPOINT";
    pub const S3_REGION_ENV: &'static str = "S3_REGION";
    pub const S3_ACCESS_KEY_ENV: &'static str = "S3_ACCESS_KEY_ID";
    pub const S3_SECRET_KEY_ENV: &'static str = "S3_SECRET_ACCESS_KEY";
    pub const S3_PATH_STYLE_ENV: &'static str = "S3_FORCE_PATH_STYLE";
    pub const TIMEOUT_ENV: &'static str = "STORAGE_TIMEOUT";

    /// Every variable consulted by [`StorageSettings::from_env`].
    pub const ALL_ENV: [&'static str; 10] = [
        Self::PROVIDER_ENV,
        Self::BUCKET_ENV,
        Self::GCS_ENDPOINT_ENV,
        Self::GCS_TOKEN_ENV,
        Self::S3_ENDPOINT_ENV,
        Self::S3_REGION_ENV,
        Self::S3_ACCESS_KEY_ENV,
        Self::S3_SECRET_KEY_ENV,
        Self::S3_PATH_STYLE_ENV,
        Self::TIMEOUT_ENV,
    ];

    const DEFAULT_BUCKET: &'static str = "default";
    const DEFAULT_GCS_ENDPOINT: &'static str = "https://storage.googleapis.com";

    /// Load settings from environment variables.
    ///
    /// * `STORAGE_PROVIDER` — `gcs` (default), `s3` or `memory`.
    /// * `BUCKET_NAME`      — bucket holding the session segments (default: `default`).
    /// * `S3_FORCE_PATH_STYLE` — path-style addressing, enabled only by the literal `true`.
    /// * `STORAGE_TIMEOUT`  — optional per-request timeout, e.g. `30s`.
    pub fn from_env() -> Result<Self> {
        Self::from_map(std::env::vars().collect())
    }

    pub fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        let non_blank = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = match non_blank(Self::PROVIDER_ENV) {
            None => ProviderKind::Gcs,
            Some(raw) => match ProviderKind::parse(&raw) {
                Some(kind) => kind,
                None => bail!(
                    "unsupported storage provider `{raw}` in {} (expected gcs, s3 or memory)",
                    Self::PROVIDER_ENV
                ),
            },
        };
        let timeout = non_blank(Self::TIMEOUT_ENV)
            .map(|raw| {
                humantime::parse_duration(&raw).with_context(|| {
                    format!("invalid duration `{raw}` in {}", Self::TIMEOUT_ENV)
                })
            })
            .transpose()?;

        Ok(Self {
            provider,
            bucket: non_blank(Self::BUCKET_ENV).unwrap_or_else(|| Self::DEFAULT_BUCKET.to_string()),
            gcs_endpoint: non_blank(Self::GCS_ENDPOINT_ENV)
                .unwrap_or_else(|| Self::DEFAULT_GCS_ENDPOINT.to_string()),
            gcs_access_token: non_blank(Self::GCS_TOKEN_ENV),
            s3_endpoint: non_blank(Self::S3_ENDPOINT_ENV),
            s3_region: non_blank(Self::S3_REGION_ENV),
            s3_access_key_id: non_blank(Self::S3_ACCESS_KEY_ENV),
            s3_secret_access_key: non_blank(Self::S3_SECRET_KEY_ENV),
            s3_force_path_style: vars
                .get(Self::S3_PATH_STYLE_ENV)
                .is_some_and(|v| v == "true"),
            timeout,
        })
    }
}
