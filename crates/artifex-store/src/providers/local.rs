//! Local filesystem provider using [`object_store::local::LocalFileSystem`].

use std::path::PathBuf;

use object_store::local::LocalFileSystem;
use url::Url;

use super::Provider;
use crate::client::ObjectStoreClient;
use crate::signer::HmacSigner;
use crate::{Error, Result};

/// Root directory and signing parameters for a local bucket.
#[derive(Debug, Clone)]
pub struct LocalCredentials {
    /// Directory acting as the bucket root; created if missing.
    pub root: PathBuf,
    /// Base URL the signed URLs point below.
    pub signing_url: String,
    /// HMAC secret for signing.
    pub signing_secret: String,
}

/// Directory-backed bucket, served to workers by an HTTP frontend that
/// checks signatures with [`HmacSigner::verify`].
pub struct LocalProvider;

impl Provider for LocalProvider {
    type Credentials = LocalCredentials;

    const ID: &'static str = "local";

    fn connect(creds: &Self::Credentials) -> Result<ObjectStoreClient> {
        std::fs::create_dir_all(&creds.root).map_err(|e| {
            Error::configuration(format!(
                "cannot create store root '{}': {e}",
                creds.root.display()
            ))
        })?;

        let store = LocalFileSystem::new_with_prefix(&creds.root)
            .map_err(|e| Error::configuration(e.to_string()))?;

        let base = Url::parse(&creds.signing_url).map_err(|e| {
            Error::configuration(format!("invalid signing URL '{}': {e}", creds.signing_url))
        })?;
        let signer = HmacSigner::new(base, creds.signing_secret.as_bytes())?;

        Ok(ObjectStoreClient::new(store, signer))
    }
}
