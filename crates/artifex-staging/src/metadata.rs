//! Persisted record of a project's current version.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{ContentHash, Result};

/// Pointer to the content hash a project currently resolves to.
///
/// Written to the project's metadata key on every create or update commit;
/// the last writer wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    /// Content hash of the current version.
    pub hash: ContentHash,
    /// Top level assembly inside the source archive, if any.
    pub top_level_assembly: Option<String>,
    /// Whether the model is an assembly rather than a single part.
    pub is_assembly: bool,
}

impl ProjectMetadata {
    /// Creates a new metadata record.
    pub fn new(hash: ContentHash, top_level_assembly: Option<String>, is_assembly: bool) -> Self {
        Self {
            hash,
            top_level_assembly: top_level_assembly.filter(|name| !name.is_empty()),
            is_assembly,
        }
    }

    /// Serializes the record as indented JSON.
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec_pretty(self)?))
    }

    /// Parses a stored record.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn hash() -> ContentHash {
        ContentHash::of(&json!({ "p": { "value": "1" } })).unwrap()
    }

    #[test]
    fn flat_document_layout() {
        let metadata = ProjectMetadata::new(hash(), Some("Wrench.iam".to_owned()), true);
        let value: Value = serde_json::from_slice(&metadata.to_bytes().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "hash": hash().as_str(),
                "topLevelAssembly": "Wrench.iam",
                "isAssembly": true,
            })
        );
    }

    #[test]
    fn empty_assembly_name_is_null() {
        let metadata = ProjectMetadata::new(hash(), Some(String::new()), false);
        let value: Value = serde_json::from_slice(&metadata.to_bytes().unwrap()).unwrap();
        assert_eq!(value["topLevelAssembly"], Value::Null);
    }

    #[test]
    fn reads_back() {
        let metadata = ProjectMetadata::new(hash(), None, false);
        let bytes = metadata.to_bytes().unwrap();
        assert_eq!(ProjectMetadata::from_slice(&bytes).unwrap(), metadata);
    }
}
