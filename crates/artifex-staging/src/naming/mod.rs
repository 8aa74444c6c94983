//! Canonical object naming.
//!
//! Derived files are addressed in two tiers, each with its own derivation:
//!
//! - [`ProjectKeys`] - project-scoped, hash-independent keys that are
//!   overwritten whenever the current version changes (metadata record,
//!   thumbnail shortcut)
//! - [`CanonicalKeySet`] - `(project, hash)`-scoped keys of immutable history
//!
//! ```text
//! attributes/{project}/metadata.json
//! attributes/{project}/thumbnail.png
//! cache/{project}/{hash}/model-view.zip
//! cache/{project}/{hash}/parameters.json
//! cache/{project}/{hash}/bom.json
//! cache/{project}/{hash}/model.zip | model.ipt
//! cache/{project}/{hash}/result.rfa
//! cache/{project}/{hash}/drawing-viewables.pdf
//! ```

mod project;

pub use project::ProjectIdentity;
use serde::{Deserialize, Serialize};

use crate::{ArtifactKind, ContentHash};

/// Root of the mutable, project-scoped tier.
pub const ATTRIBUTES_PREFIX: &str = "attributes";

/// Root of the immutable, hash-scoped tier.
pub const CACHE_PREFIX: &str = "cache";

/// Hash-independent keys of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectKeys {
    /// Record pointing at the current content hash.
    pub metadata: String,
    /// Thumbnail of the current version.
    pub thumbnail: String,
}

impl ProjectKeys {
    /// Derives the pointer-tier keys of `project`.
    pub fn derive(project: &ProjectIdentity) -> Self {
        let root = format!("{ATTRIBUTES_PREFIX}/{project}");
        Self {
            metadata: format!("{root}/metadata.json"),
            thumbnail: format!("{root}/thumbnail.png"),
        }
    }
}

/// Immutable keys of one `(project, hash)` version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalKeySet {
    /// Whether [`Self::current_model`] holds an assembly or a part.
    pub is_assembly: bool,
    /// Zipped web viewables.
    pub model_view: String,
    /// Parameters the hash was computed from.
    pub parameters: String,
    /// Bill of materials.
    pub bom: String,
    /// The generated model, assembly or part variant.
    pub current_model: String,
    /// Native authoring format.
    pub rfa: String,
    /// Drawing sheets for viewing.
    pub drawing_viewables: String,
}

impl CanonicalKeySet {
    /// Derives the hash-tier keys for a version of `project`.
    pub fn derive(project: &ProjectIdentity, hash: &ContentHash, is_assembly: bool) -> Self {
        let root = format!("{CACHE_PREFIX}/{project}/{hash}");
        let model = if is_assembly { "model.zip" } else { "model.ipt" };

        Self {
            is_assembly,
            model_view: format!("{root}/model-view.zip"),
            parameters: format!("{root}/parameters.json"),
            bom: format!("{root}/bom.json"),
            current_model: format!("{root}/{model}"),
            rfa: format!("{root}/result.rfa"),
            drawing_viewables: format!("{root}/drawing-viewables.pdf"),
        }
    }

    /// Returns the canonical key of `kind`, if it has a hash-scoped form.
    ///
    /// Thumbnails live in the pointer tier, intermediate formats and input
    /// parameters are never promoted, and only the model variant matching
    /// [`Self::is_assembly`] is addressable.
    pub fn key(&self, kind: ArtifactKind) -> Option<&str> {
        let key = match kind {
            ArtifactKind::ModelView => &self.model_view,
            ArtifactKind::Parameters => &self.parameters,
            ArtifactKind::BillOfMaterials => &self.bom,
            ArtifactKind::OutputModelAssembly if self.is_assembly => &self.current_model,
            ArtifactKind::OutputModelPart if !self.is_assembly => &self.current_model,
            ArtifactKind::OutputDerivedFormatB => &self.rfa,
            ArtifactKind::DrawingViewables => &self.drawing_viewables,
            ArtifactKind::Thumbnail
            | ArtifactKind::InputParameters
            | ArtifactKind::IntermediateFormatA
            | ArtifactKind::OutputModelAssembly
            | ArtifactKind::OutputModelPart => return None,
        };
        Some(key.as_str())
    }

    /// All keys of the set.
    pub fn keys(&self) -> [&str; 6] {
        [
            &self.model_view,
            &self.parameters,
            &self.bom,
            &self.current_model,
            &self.rfa,
            &self.drawing_viewables,
        ]
    }
}
