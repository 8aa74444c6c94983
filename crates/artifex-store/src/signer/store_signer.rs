//! Native presigned URLs through [`object_store::signer::Signer`].

use std::sync::Arc;
use std::time::Duration;

use object_store::path::Path;
use object_store::signer::Signer;
use url::Url;

use super::UrlSigner;
use crate::client::SignMethod;
use crate::{Error, Result};

/// Delegates signing to a cloud store's own presigning (e.g. S3 SigV4).
#[derive(Clone)]
pub struct StoreSigner(Arc<dyn Signer>);

impl StoreSigner {
    /// Wrap a concrete [`Signer`] implementation.
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        Self(signer)
    }
}

#[async_trait::async_trait]
impl UrlSigner for StoreSigner {
    async fn sign(&self, key: &str, method: SignMethod, ttl: Duration) -> Result<Url> {
        let method = match method {
            SignMethod::Get => http::Method::GET,
            SignMethod::Put => http::Method::PUT,
        };

        self.0
            .signed_url(method, &Path::from(key), ttl)
            .await
            .map_err(|e| Error::signing(key, e.to_string()))
    }
}

impl std::fmt::Debug for StoreSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSigner").finish_non_exhaustive()
    }
}
