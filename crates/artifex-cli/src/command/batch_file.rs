//! Batch persistence between the prepare and commit invocations.

use std::path::Path;

use anyhow::Context;
use artifex_staging::StagingBatch;

use crate::TRACING_TARGET_COMMAND;

/// Reads the batch stored at `path`.
pub async fn load(path: &Path) -> anyhow::Result<StagingBatch> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read batch file {}", path.display()))?;
    let batch: StagingBatch = serde_json::from_slice(&bytes)
        .with_context(|| format!("malformed batch file {}", path.display()))?;

    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        path = %path.display(),
        batch = %batch.id(),
        state = %batch.state(),
        "Batch loaded"
    );

    Ok(batch)
}

/// Reads the batch at `path`, or starts a new one if there is none.
pub async fn load_or_new(path: &Path) -> anyhow::Result<StagingBatch> {
    if tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("failed to access batch file {}", path.display()))?
    {
        load(path).await
    } else {
        Ok(StagingBatch::new())
    }
}

/// Writes `batch` to `path`, replacing the previous contents.
pub async fn save(path: &Path, batch: &StagingBatch) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(batch).context("failed to serialize batch")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write batch file {}", path.display()))?;

    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        path = %path.display(),
        batch = %batch.id(),
        state = %batch.state(),
        "Batch saved"
    );

    Ok(())
}
