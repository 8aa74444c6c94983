#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod client;
mod config;
mod error;
/// Provider trait and object storage provider factories.
pub mod providers;
/// URL signing backends.
pub mod signer;

#[doc(hidden)]
pub mod prelude;

pub use client::{ObjectAccess, ObjectInfo, ObjectStoreClient, SignMethod, SignedUrl};
pub use config::{StoreBackend, StoreConfig};
pub use error::{Error, Result};

/// Tracing target for object store operations.
pub const TRACING_TARGET: &str = "artifex_store";
