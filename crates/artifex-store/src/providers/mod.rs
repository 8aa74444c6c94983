//! Provider trait and object storage provider factories.

mod local;
mod memory;
#[cfg(feature = "aws")]
mod s3;

pub use local::{LocalCredentials, LocalProvider};
pub use memory::{MemoryCredentials, MemoryProvider};
#[cfg(feature = "aws")]
#[cfg_attr(docsrs, doc(cfg(feature = "aws")))]
pub use s3::{S3Credentials, S3Provider};

use crate::Result;
use crate::client::ObjectStoreClient;

/// Factory for bucket-scoped clients of one storage backend.
///
/// Implementations validate credentials, build the backing
/// [`object_store::ObjectStore`] and pair it with a matching URL signer.
pub trait Provider {
    /// Strongly-typed credentials for this provider.
    type Credentials;

    /// Unique identifier (e.g. "s3", "local").
    const ID: &'static str;

    /// Create a connected client.
    fn connect(creds: &Self::Credentials) -> Result<ObjectStoreClient>;
}
