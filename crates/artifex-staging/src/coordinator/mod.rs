//! Orchestration of the prepare and commit halves of a pipeline run.
//!
//! A run goes through two calls on the same [`StagingBatch`]:
//!
//! 1. a `prepare_for_*` operation reserves temp keys, issues signed URLs
//!    for them concurrently and returns a bundle for the pipeline
//! 2. once the pipeline reports completion, the matching `commit_*`
//!    operation hashes the produced parameters and promotes every staged
//!    object to its canonical key
//!
//! Batch operations fan out over the store and wait for every call before
//! reporting. The first failure is surfaced; completed siblings are not
//! rolled back.

mod commit;
mod fanout;
mod prepare;
#[cfg(test)]
mod testing;

use artifex_store::ObjectStoreClient;

use crate::naming::ProjectKeys;
use crate::{ProjectIdentity, ProjectMetadata, Result, StagingConfig, TRACING_TARGET};

/// Stages pipeline outputs and promotes them to content-addressed keys.
///
/// The coordinator holds no per-run state: everything a run needs lives in
/// its [`StagingBatch`], so one coordinator can serve any number of
/// concurrent runs.
///
/// [`StagingBatch`]: crate::StagingBatch
#[derive(Debug, Clone)]
pub struct StagingCoordinator {
    client: ObjectStoreClient,
    config: StagingConfig,
}

impl StagingCoordinator {
    /// Creates a coordinator operating on the bucket behind `client`.
    pub fn new(client: ObjectStoreClient, config: StagingConfig) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            target: TRACING_TARGET,
            client = ?client,
            signed_url_ttl_secs = config.signed_url_ttl_secs,
            "Staging coordinator created"
        );

        Ok(Self { client, config })
    }

    /// Returns the underlying store client.
    pub fn client(&self) -> &ObjectStoreClient {
        &self.client
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Reads the current version pointer of `project`.
    ///
    /// Returns `None` when nothing was ever committed for it.
    #[tracing::instrument(name = "staging.load_metadata", skip(self), fields(project = %project))]
    pub async fn load_metadata(
        &self,
        project: &ProjectIdentity,
    ) -> Result<Option<ProjectMetadata>> {
        let key = ProjectKeys::derive(project).metadata;

        match self.client.download(&key).await {
            Ok(bytes) => ProjectMetadata::from_slice(&bytes).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
