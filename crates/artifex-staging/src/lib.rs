#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for coordinator-wide events.
///
/// Use this target for coordinator setup and failures of concurrent batches.
pub const TRACING_TARGET: &str = "artifex_staging";

/// Tracing target for the prepare half of a pipeline run.
///
/// Use this target for temp key allocation, URL issuance and parameter uploads.
pub const TRACING_TARGET_PREPARE: &str = "artifex_staging::prepare";

/// Tracing target for the commit half of a pipeline run.
///
/// Use this target for hashing, promotion and metadata writes.
pub const TRACING_TARGET_COMMIT: &str = "artifex_staging::commit";

mod artifact;
mod batch;
pub mod bundle;
mod config;
mod content_hash;
mod coordinator;
mod error;
mod metadata;
pub mod naming;
mod temp_key;

#[doc(hidden)]
pub mod prelude;

pub use artifact::ArtifactKind;
pub use batch::{StagingBatch, StagingState};
pub use bundle::{AdoptionBundle, ProcessingBundle, UpdateBundle};
pub use config::StagingConfig;
pub use content_hash::{ContentHash, canonicalize};
pub use coordinator::StagingCoordinator;
pub use error::{Error, Result};
pub use metadata::ProjectMetadata;
pub use naming::{CanonicalKeySet, ProjectIdentity, ProjectKeys};
pub use temp_key::{STAGING_PREFIX, TempKey};
