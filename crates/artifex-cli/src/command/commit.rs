use std::path::PathBuf;

use anyhow::Context;
use artifex_staging::{ContentHash, ProjectIdentity, StagingBatch, StagingCoordinator};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::{batch_file, print_json};
use crate::TRACING_TARGET_COMMAND;

/// Arguments of `commit`.
#[derive(Debug, Clone, Args)]
pub struct CommitArgs {
    /// Batch file written by `prepare`
    #[arg(long, short = 'b')]
    pub batch: PathBuf,

    #[command(subcommand)]
    pub stage: CommitStage,
}

/// Pipeline stage to commit.
#[derive(Debug, Clone, Subcommand)]
pub enum CommitStage {
    /// Promote the outputs of a create or update run.
    Create {
        project: ProjectIdentity,
        #[arg(long)]
        top_level_assembly: Option<String>,
    },
    /// Promote regenerated viewables of an update run.
    Viewables {
        project: ProjectIdentity,
        /// The model is an assembly rather than a part
        #[arg(long)]
        assembly: bool,
    },
    /// Promote the derived native format of a committed version.
    Rfa {
        project: ProjectIdentity,
        hash: ContentHash,
    },
    /// Promote drawing viewables of a committed version.
    Drawing {
        project: ProjectIdentity,
        hash: ContentHash,
    },
}

/// Printed on success.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitOutput {
    project: ProjectIdentity,
    hash: ContentHash,
}

impl CommitArgs {
    pub async fn run(self, coordinator: &StagingCoordinator) -> anyhow::Result<()> {
        let mut batch = batch_file::load(&self.batch).await?;
        let committed = commit(coordinator, &mut batch, self.stage).await;

        batch_file::save(&self.batch, &batch).await?;
        let output = committed.context("commit failed")?;

        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            batch = %batch.id(),
            project = %output.project,
            hash = %output.hash,
            "Batch committed"
        );

        print_json(&output)
    }
}

async fn commit(
    coordinator: &StagingCoordinator,
    batch: &mut StagingBatch,
    stage: CommitStage,
) -> anyhow::Result<CommitOutput> {
    let (project, hash) = match stage {
        CommitStage::Create {
            project,
            top_level_assembly,
        } => {
            let hash = coordinator
                .commit_create_or_update(batch, &project, top_level_assembly)
                .await?;
            (project, hash)
        }
        CommitStage::Viewables { project, assembly } => {
            let hash = coordinator
                .commit_viewables_only(batch, &project, assembly)
                .await?;
            (project, hash)
        }
        CommitStage::Rfa { project, hash } => {
            coordinator.commit_rfa(batch, &project, &hash).await?;
            (project, hash)
        }
        CommitStage::Drawing { project, hash } => {
            coordinator
                .commit_drawing_viewables(batch, &project, &hash)
                .await?;
            (project, hash)
        }
    };
    Ok(CommitOutput { project, hash })
}
