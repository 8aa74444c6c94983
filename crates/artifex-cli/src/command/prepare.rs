use std::path::{Path, PathBuf};

use anyhow::Context;
use artifex_staging::{ProjectIdentity, StagingBatch, StagingCoordinator};
use clap::{Args, Subcommand};
use serde_json::Value;
use url::Url;

use super::{batch_file, print_json};
use crate::TRACING_TARGET_COMMAND;

/// Arguments of `prepare`.
#[derive(Debug, Clone, Args)]
pub struct PrepareArgs {
    /// Batch file; created when missing, reused by later stages
    #[arg(long, short = 'b')]
    pub batch: PathBuf,

    #[command(subcommand)]
    pub stage: PrepareStage,
}

/// Pipeline stage to prepare.
#[derive(Debug, Clone, Subcommand)]
pub enum PrepareStage {
    /// Adopt a source document into a project.
    Create {
        project: ProjectIdentity,
        source: Url,
        /// Top level assembly inside a zipped source
        #[arg(long)]
        top_level_assembly: Option<String>,
    },
    /// Regenerate a project from a parameters document.
    Update {
        project: ProjectIdentity,
        source: Url,
        /// Parameters document to upload
        #[arg(long)]
        parameters: PathBuf,
        #[arg(long)]
        top_level_assembly: Option<String>,
    },
    /// Convert to the intermediate exchange format.
    Sat {
        source: Url,
        #[arg(long)]
        top_level_assembly: Option<String>,
    },
    /// Derive the native format from the intermediate one.
    Rfa { source: Url },
    /// Render drawing viewables.
    Drawing {
        source: Url,
        #[arg(long)]
        top_level_assembly: Option<String>,
    },
}

impl PrepareArgs {
    pub async fn run(self, coordinator: &StagingCoordinator) -> anyhow::Result<()> {
        let mut batch = batch_file::load_or_new(&self.batch).await?;
        let prepared = prepare(coordinator, &mut batch, self.stage).await;

        // failed batches are persisted too, so they cannot be reused by mistake
        batch_file::save(&self.batch, &batch).await?;
        let bundle = prepared.context("prepare failed")?;

        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            batch = %batch.id(),
            state = %batch.state(),
            "Batch prepared"
        );

        print_json(&bundle)
    }
}

async fn prepare(
    coordinator: &StagingCoordinator,
    batch: &mut StagingBatch,
    stage: PrepareStage,
) -> anyhow::Result<Value> {
    let bundle = match stage {
        PrepareStage::Create {
            project,
            source,
            top_level_assembly,
        } => serde_json::to_value(
            coordinator
                .prepare_for_create(batch, &project, source, top_level_assembly)
                .await?,
        )?,
        PrepareStage::Update {
            project,
            source,
            parameters,
            top_level_assembly,
        } => {
            let parameters = read_parameters(&parameters).await?;
            serde_json::to_value(
                coordinator
                    .prepare_for_update(batch, &project, source, top_level_assembly, &parameters)
                    .await?,
            )?
        }
        PrepareStage::Sat {
            source,
            top_level_assembly,
        } => serde_json::to_value(
            coordinator
                .prepare_for_sat(batch, source, top_level_assembly)
                .await?,
        )?,
        PrepareStage::Rfa { source } => {
            serde_json::to_value(coordinator.prepare_for_rfa(batch, source).await?)?
        }
        PrepareStage::Drawing {
            source,
            top_level_assembly,
        } => serde_json::to_value(
            coordinator
                .prepare_for_drawing_viewables(batch, source, top_level_assembly)
                .await?,
        )?,
    };
    Ok(bundle)
}

async fn read_parameters(path: &Path) -> anyhow::Result<Value> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("{} is not valid JSON", path.display()))
}
