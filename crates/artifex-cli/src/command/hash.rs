use std::path::PathBuf;

use anyhow::Context;
use artifex_staging::ContentHash;
use clap::Args;

/// Arguments of `hash`.
#[derive(Debug, Clone, Args)]
pub struct HashArgs {
    /// Parameters document
    pub file: PathBuf,
}

impl HashArgs {
    pub async fn run(self) -> anyhow::Result<()> {
        let hash = self.compute().await?;
        println!("{hash}");
        Ok(())
    }

    async fn compute(&self) -> anyhow::Result<ContentHash> {
        let bytes = tokio::fs::read(&self.file)
            .await
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        ContentHash::from_slice(&bytes)
            .with_context(|| format!("cannot hash {}", self.file.display()))
    }
}
