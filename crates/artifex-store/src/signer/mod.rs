//! URL signing backends.
//!
//! Object stores differ in how they hand out time-scoped credentials, so
//! signing sits behind the [`UrlSigner`] trait:
//!
//! - [`HmacSigner`] - HMAC-SHA256 signed URLs for the in-memory and local
//!   filesystem backends, verifiable with [`HmacSigner::verify`]
//! - `StoreSigner` - native presigned URLs of a cloud store (feature `aws`)

mod hmac_signer;
#[cfg(feature = "aws")]
mod store_signer;

use std::time::Duration;

pub use hmac_signer::HmacSigner;
#[cfg(feature = "aws")]
#[cfg_attr(docsrs, doc(cfg(feature = "aws")))]
pub use store_signer::StoreSigner;
use url::Url;

use crate::Result;
use crate::client::SignMethod;

/// Produces presigned URLs for single object keys.
#[async_trait::async_trait]
pub trait UrlSigner: Send + Sync + 'static {
    /// Sign `key` for `method`, valid for `ttl`.
    async fn sign(&self, key: &str, method: SignMethod, ttl: Duration) -> Result<Url>;
}
