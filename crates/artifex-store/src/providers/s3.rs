//! S3-compatible provider using [`object_store::aws::AmazonS3Builder`].
//!
//! Works with AWS S3, MinIO, and any S3-compatible service. Refusing renames
//! rely on conditional multipart completion (`If-None-Match` on
//! `CompleteMultipartUpload`), so the service must support it.

use std::sync::Arc;

use object_store::aws::{AmazonS3Builder, S3CopyIfNotExists};

use super::Provider;
use crate::client::ObjectStoreClient;
use crate::signer::StoreSigner;
use crate::{Error, Result};

/// Typed credentials for S3-compatible provider.
#[derive(Debug, Clone)]
pub struct S3Credentials {
    /// S3 bucket name.
    pub bucket: String,
    /// AWS region.
    pub region: String,
    /// Endpoint URL (e.g. `http://localhost:9000` for MinIO).
    /// Required for non-AWS S3-compatible services.
    pub endpoint: Option<String>,
    /// Access key ID for static credentials.
    pub access_key_id: Option<String>,
    /// Secret access key for static credentials.
    pub secret_access_key: Option<String>,
}

/// S3-backed bucket with SigV4 presigned URLs.
pub struct S3Provider;

impl Provider for S3Provider {
    type Credentials = S3Credentials;

    const ID: &'static str = "s3";

    fn connect(creds: &Self::Credentials) -> Result<ObjectStoreClient> {
        let store = Arc::new(
            builder(creds)
                .build()
                .map_err(|e| Error::configuration(format!("{}: {e}", Self::ID)))?,
        );

        Ok(ObjectStoreClient::from_parts(
            store.clone(),
            Arc::new(StoreSigner::new(store)),
        ))
    }
}

fn builder(creds: &S3Credentials) -> AmazonS3Builder {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(&creds.bucket)
        .with_region(&creds.region)
        .with_copy_if_not_exists(S3CopyIfNotExists::Multipart);

    if let Some(endpoint) = &creds.endpoint {
        builder = builder.with_endpoint(endpoint);
        if endpoint.starts_with("http://") {
            builder = builder.with_allow_http(true);
        }
    }

    if let Some(access_key) = &creds.access_key_id {
        builder = builder.with_access_key_id(access_key);
    }

    if let Some(secret_key) = &creds.secret_access_key {
        builder = builder.with_secret_access_key(secret_key);
    }

    builder
}
