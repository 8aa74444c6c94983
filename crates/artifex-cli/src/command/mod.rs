//! Subcommands.
//!
//! `prepare` and `commit` are the two halves of a pipeline run and usually
//! execute in different processes, so the batch is kept in a JSON file
//! between them (`--batch`). `hash` and `show` are read-only helpers.

mod batch_file;
mod commit;
mod hash;
mod prepare;
mod show;

use anyhow::Context;
use artifex_staging::{StagingConfig, StagingCoordinator};
use artifex_store::StoreConfig;
use clap::Subcommand;
pub use commit::CommitArgs;
pub use hash::HashArgs;
pub use prepare::PrepareArgs;
pub use show::ShowArgs;

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Reserve temp keys and print the bundle for the pipeline.
    Prepare(PrepareArgs),
    /// Promote the outputs of a finished pipeline run.
    Commit(CommitArgs),
    /// Print the content hash of a parameters document.
    Hash(HashArgs),
    /// Print the current version record of a project.
    Show(ShowArgs),
}

impl Command {
    /// Runs the subcommand against the configured store.
    pub async fn run(self, store: &StoreConfig, staging: &StagingConfig) -> anyhow::Result<()> {
        match self {
            Self::Prepare(args) => args.run(&connect(store, staging)?).await,
            Self::Commit(args) => args.run(&connect(store, staging)?).await,
            Self::Hash(args) => args.run().await,
            Self::Show(args) => args.run(&connect(store, staging)?).await,
        }
    }
}

fn connect(store: &StoreConfig, staging: &StagingConfig) -> anyhow::Result<StagingCoordinator> {
    let client = store
        .connect()
        .context("failed to connect to the object store")?;
    StagingCoordinator::new(client, staging.clone()).context("failed to create the coordinator")
}

/// Writes `value` to stdout as indented JSON.
fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}
