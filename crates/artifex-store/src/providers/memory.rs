//! In-process provider backed by [`object_store::memory::InMemory`].

use object_store::memory::InMemory;
use url::Url;

use super::Provider;
use crate::client::ObjectStoreClient;
use crate::signer::HmacSigner;
use crate::{Error, Result};

/// Signing parameters for the in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryCredentials {
    /// Base URL the signed URLs point below.
    pub signing_url: String,
    /// HMAC secret for signing.
    pub signing_secret: String,
}

/// Volatile store, used for development and tests.
pub struct MemoryProvider;

impl Provider for MemoryProvider {
    type Credentials = MemoryCredentials;

    const ID: &'static str = "memory";

    fn connect(creds: &Self::Credentials) -> Result<ObjectStoreClient> {
        let base = Url::parse(&creds.signing_url).map_err(|e| {
            Error::configuration(format!("invalid signing URL '{}': {e}", creds.signing_url))
        })?;
        let signer = HmacSigner::new(base, creds.signing_secret.as_bytes())?;

        Ok(ObjectStoreClient::new(InMemory::new(), signer))
    }
}
