use anyhow::Context;
use artifex_staging::{ProjectIdentity, StagingCoordinator};
use clap::Args;

use super::print_json;

/// Arguments of `show`.
#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    pub project: ProjectIdentity,
}

impl ShowArgs {
    pub async fn run(self, coordinator: &StagingCoordinator) -> anyhow::Result<()> {
        let metadata = coordinator
            .load_metadata(&self.project)
            .await
            .context("failed to read project metadata")?
            .with_context(|| format!("project '{}' has no committed version", self.project))?;

        print_json(&metadata)
    }
}
