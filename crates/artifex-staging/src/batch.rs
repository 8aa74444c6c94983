//! Per-invocation staging batch.

use std::collections::BTreeMap;

use artifex_store::SignedUrl;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoEnumIterator};
use uuid::Uuid;

use crate::{ArtifactKind, Error, Result, TempKey};

/// Lifecycle of a staging batch.
///
/// ```text
/// Preparing ──► AwaitingPipeline ──► Committing ──► Done
///     │   ◄────────────┘ │                │
///     └──────────────────┴────────────────┴──────► Failed
/// ```
///
/// A batch waiting for the pipeline may be prepared again for a later
/// stage of a multi-stage conversion. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StagingState {
    /// Locations and credentials are being reserved.
    Preparing,
    /// URLs were handed out; the external pipeline owns the staged objects.
    AwaitingPipeline,
    /// Staged objects are being promoted.
    Committing,
    /// Every staged artifact was promoted or discarded.
    Done,
    /// An operation failed; the batch's keys must not be reused.
    Failed,
}

impl StagingState {
    /// Whether no further operation is accepted.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Temp keys and signed URLs reserved for one pipeline invocation.
///
/// A batch allocates a fresh [`TempKey`] for every [`ArtifactKind`] when it
/// is created and records which of them a prepare step actually handed to
/// the pipeline. It is owned by the invocation that created it and can be
/// serialized so the prepare and commit halves may run in different
/// processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagingBatch {
    id: Uuid,
    state: StagingState,
    created_at: Timestamp,
    keys: BTreeMap<ArtifactKind, TempKey>,
    #[serde(default)]
    staged: BTreeMap<ArtifactKind, SignedUrl>,
}

impl StagingBatch {
    /// Creates a batch with freshly allocated temp keys.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: StagingState::Preparing,
            created_at: Timestamp::now(),
            keys: ArtifactKind::iter()
                .map(|kind| (kind, TempKey::generate(kind)))
                .collect(),
            staged: BTreeMap::new(),
        }
    }

    /// Returns the batch identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the current state.
    pub fn state(&self) -> StagingState {
        self.state
    }

    /// Returns the creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns the temp key reserved for `kind`.
    pub fn temp_key(&self, kind: ArtifactKind) -> Result<&TempKey> {
        self.keys
            .get(&kind)
            .ok_or_else(|| Error::missing_artifact(kind))
    }

    /// Returns the URLs issued for `kind`, if it was staged.
    pub fn signed_url(&self, kind: ArtifactKind) -> Option<&SignedUrl> {
        self.staged.get(&kind)
    }

    /// Whether a prepare step handed `kind` to the pipeline.
    pub fn is_staged(&self, kind: ArtifactKind) -> bool {
        self.staged.contains_key(&kind)
    }

    /// Kinds handed to the pipeline so far.
    pub fn staged_kinds(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.staged.keys().copied()
    }

    /// Returns the temp key of `kind`, failing unless it was staged.
    pub(crate) fn staged_key(&self, kind: ArtifactKind) -> Result<&TempKey> {
        if !self.is_staged(kind) {
            return Err(Error::missing_artifact(kind));
        }
        self.temp_key(kind)
    }

    pub(crate) fn begin_prepare(&mut self, operation: &'static str) -> Result<()> {
        match self.state {
            StagingState::Preparing | StagingState::AwaitingPipeline => {
                self.state = StagingState::Preparing;
                Ok(())
            }
            state => Err(Error::invalid_state(operation, state)),
        }
    }

    pub(crate) fn begin_commit(&mut self, operation: &'static str) -> Result<()> {
        match self.state {
            StagingState::AwaitingPipeline => {
                self.state = StagingState::Committing;
                Ok(())
            }
            state => Err(Error::invalid_state(operation, state)),
        }
    }

    pub(crate) fn record(&mut self, kind: ArtifactKind, url: SignedUrl) {
        self.staged.insert(kind, url);
    }

    /// Moves to the state following a finished prepare or commit, or to
    /// [`StagingState::Failed`] when it did not finish.
    pub(crate) fn settle<T>(&mut self, result: &Result<T>) {
        self.state = match (result, self.state) {
            (Err(_), _) => StagingState::Failed,
            (Ok(_), StagingState::Preparing) => StagingState::AwaitingPipeline,
            (Ok(_), StagingState::Committing) => StagingState::Done,
            (Ok(_), state) => state,
        };
    }
}

impl Default for StagingBatch {
    fn default() -> Self {
        Self::new()
    }
}
