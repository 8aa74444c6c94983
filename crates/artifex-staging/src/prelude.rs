//! Convenience re-exports.

pub use crate::bundle::{AdoptionBundle, ProcessingBundle, UpdateBundle};
pub use crate::naming::{CanonicalKeySet, ProjectIdentity, ProjectKeys};
pub use crate::{
    ArtifactKind, ContentHash, Error, ProjectMetadata, Result, StagingBatch, StagingConfig,
    StagingCoordinator, StagingState,
};
