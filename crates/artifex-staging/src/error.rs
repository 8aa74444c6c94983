//! Error types for staging and commit operations.

use crate::ArtifactKind;
use crate::batch::StagingState;

/// Result type for all staging operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for staging and commit operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure reported by the object store, propagated unmodified.
    #[error(transparent)]
    Storage(#[from] artifex_store::Error),

    /// The parameters document is malformed or misses required fields.
    #[error("Invalid parameters document: {reason}")]
    HashInput { reason: String },

    /// The staged parameters could not be read or hashed at commit time.
    #[error("Cannot compute content hash from '{key}': {reason}")]
    HashComputation { key: String, reason: String },

    /// The project identity cannot be used to build object keys.
    #[error("Invalid project identity '{name}': {reason}")]
    InvalidProject { name: String, reason: String },

    /// The batch is in a state that does not allow the operation.
    #[error("Cannot {operation} a batch in state {state}")]
    InvalidState {
        operation: &'static str,
        state: StagingState,
    },

    /// The batch never staged an artifact the operation needs.
    #[error("Artifact {kind} was not staged by this batch")]
    MissingArtifact { kind: ArtifactKind },

    /// A staging configuration value is out of range.
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Serialization of an uploaded document failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a hash input error.
    pub fn hash_input(reason: impl Into<String>) -> Self {
        Self::HashInput {
            reason: reason.into(),
        }
    }

    /// Create a hash computation error.
    pub fn hash_computation(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HashComputation {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid project error.
    pub fn invalid_project(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProject {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(operation: &'static str, state: StagingState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create a missing artifact error.
    pub fn missing_artifact(kind: ArtifactKind) -> Self {
        Self::MissingArtifact { kind }
    }

    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns `true` when a store call targeted a key that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_not_found())
    }

    /// Whether retrying the whole operation with a fresh batch may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_retryable())
    }
}
