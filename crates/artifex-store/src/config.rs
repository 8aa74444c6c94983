//! Object store configuration.

use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::client::ObjectStoreClient;
#[cfg(feature = "aws")]
use crate::providers::{S3Credentials, S3Provider};
use crate::providers::{
    LocalCredentials, LocalProvider, MemoryCredentials, MemoryProvider, Provider,
};
use crate::{Error, Result, TRACING_TARGET};

/// Storage backend selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreBackend {
    /// Volatile in-process store.
    #[default]
    Memory,
    /// Directory on the local filesystem.
    Local,
    /// Amazon S3 or an S3-compatible service.
    S3,
}

// Default values
const DEFAULT_SIGNING_URL: &str = "http://localhost:8080/objects/";
const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for the bucket the staging layer operates on.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StoreConfig {
    /// Storage backend
    #[cfg_attr(
        feature = "config",
        arg(long = "store-backend", env = "STORE_BACKEND", value_enum, default_value_t)
    )]
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Bucket root directory (local backend)
    #[cfg_attr(feature = "config", arg(long = "store-root", env = "STORE_ROOT"))]
    pub store_root: Option<PathBuf>,

    /// Bucket name (s3 backend)
    #[cfg_attr(feature = "config", arg(long = "store-bucket", env = "STORE_BUCKET"))]
    pub store_bucket: Option<String>,

    /// Region (s3 backend, defaults to us-east-1)
    #[cfg_attr(feature = "config", arg(long = "store-region", env = "STORE_REGION"))]
    pub store_region: Option<String>,

    /// Custom endpoint for S3-compatible services such as MinIO
    #[cfg_attr(feature = "config", arg(long = "store-endpoint", env = "STORE_ENDPOINT"))]
    pub store_endpoint: Option<String>,

    /// Access key ID (s3 backend)
    #[cfg_attr(
        feature = "config",
        arg(long = "store-access-key-id", env = "STORE_ACCESS_KEY_ID")
    )]
    pub store_access_key_id: Option<String>,

    /// Secret access key (s3 backend)
    #[cfg_attr(
        feature = "config",
        arg(long = "store-secret-access-key", env = "STORE_SECRET_ACCESS_KEY")
    )]
    #[serde(skip_serializing)]
    pub store_secret_access_key: Option<String>,

    /// Base URL signed URLs point below (memory and local backends)
    #[cfg_attr(
        feature = "config",
        arg(long = "store-signing-url", env = "STORE_SIGNING_URL")
    )]
    pub store_signing_url: Option<String>,

    /// HMAC secret for signed URLs (memory and local backends)
    #[cfg_attr(
        feature = "config",
        arg(long = "store-signing-secret", env = "STORE_SIGNING_SECRET")
    )]
    #[serde(skip_serializing)]
    pub store_signing_secret: Option<String>,
}

impl StoreConfig {
    /// Create a configuration for the given backend with all other values unset.
    pub fn new(backend: StoreBackend) -> Self {
        Self {
            store_backend: backend,
            ..Default::default()
        }
    }

    /// Returns the signing base URL, using the default if not set.
    #[inline]
    pub fn signing_url(&self) -> &str {
        self.store_signing_url
            .as_deref()
            .unwrap_or(DEFAULT_SIGNING_URL)
    }

    /// Returns the region, using the default if not set.
    #[inline]
    pub fn region(&self) -> &str {
        self.store_region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// Set the local root directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.store_root = Some(root.into());
        self
    }

    /// Set the bucket name.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.store_bucket = Some(bucket.into());
        self
    }

    /// Set the signing secret.
    #[must_use]
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.store_signing_secret = Some(secret.into());
        self
    }

    /// Set the signing base URL.
    #[must_use]
    pub fn with_signing_url(mut self, url: impl Into<String>) -> Self {
        self.store_signing_url = Some(url.into());
        self
    }

    /// Checks that every value the selected backend needs is present.
    pub fn validate(&self) -> Result<()> {
        match self.store_backend {
            StoreBackend::Memory => {
                self.signing_secret()?;
            }
            StoreBackend::Local => {
                self.signing_secret()?;
                if self.store_root.is_none() {
                    return Err(Error::configuration("local backend requires --store-root"));
                }
            }
            StoreBackend::S3 => {
                if self.store_bucket.as_deref().is_none_or(str::is_empty) {
                    return Err(Error::configuration("s3 backend requires --store-bucket"));
                }
            }
        }
        Ok(())
    }

    /// Build a client for the configured backend.
    pub fn connect(&self) -> Result<ObjectStoreClient> {
        self.validate()?;

        let client = match self.store_backend {
            StoreBackend::Memory => MemoryProvider::connect(&MemoryCredentials {
                signing_url: self.signing_url().to_owned(),
                signing_secret: self.signing_secret()?.to_owned(),
            })?,
            StoreBackend::Local => LocalProvider::connect(&LocalCredentials {
                root: self.store_root.clone().unwrap_or_default(),
                signing_url: self.signing_url().to_owned(),
                signing_secret: self.signing_secret()?.to_owned(),
            })?,
            #[cfg(feature = "aws")]
            StoreBackend::S3 => S3Provider::connect(&S3Credentials {
                bucket: self.store_bucket.clone().unwrap_or_default(),
                region: self.region().to_owned(),
                endpoint: self.store_endpoint.clone(),
                access_key_id: self.store_access_key_id.clone(),
                secret_access_key: self.store_secret_access_key.clone(),
            })?,
            #[cfg(not(feature = "aws"))]
            StoreBackend::S3 => {
                return Err(Error::configuration(
                    "s3 backend is not supported without the `aws` feature",
                ));
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            backend = %self.store_backend,
            "Object store client initialized"
        );

        Ok(client)
    }

    fn signing_secret(&self) -> Result<&str> {
        self.store_signing_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "{} backend requires --store-signing-secret",
                    self.store_backend
                ))
            })
    }
}
