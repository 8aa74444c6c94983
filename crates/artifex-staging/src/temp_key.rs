//! Ephemeral object keys for pipeline outputs.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ArtifactKind;

/// Prefix shared by every staged object.
///
/// Canonical keys live under `cache/` and `attributes/`, so a temp key can
/// never collide with one.
pub const STAGING_PREFIX: &str = "staging";

/// A freshly allocated, never reused object key.
///
/// The key is `staging/{uuid}.{ext}`, where the UUID is a random v4
/// identifier. Uniqueness rests on the size of the identifier space, so no
/// registry or coordination between concurrent allocations is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, Display)]
#[serde(transparent)]
pub struct TempKey(String);

impl TempKey {
    /// Allocates a new key for an artifact of `kind`.
    pub fn generate(kind: ArtifactKind) -> Self {
        Self(format!(
            "{STAGING_PREFIX}/{}.{}",
            Uuid::new_v4().simple(),
            kind.extension()
        ))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TempKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
