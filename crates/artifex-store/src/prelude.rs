//! Convenience re-exports.

pub use crate::client::{ObjectAccess, ObjectInfo, ObjectStoreClient, SignMethod, SignedUrl};
pub use crate::config::{StoreBackend, StoreConfig};
pub use crate::providers::{LocalProvider, MemoryProvider, Provider};
pub use crate::signer::{HmacSigner, UrlSigner};
pub use crate::{Error, Result};
