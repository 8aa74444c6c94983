//! Kinds of derived files produced by the processing pipeline.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Closed set of artifacts the pipeline can produce for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    /// Preview image of the model.
    Thumbnail,
    /// Zipped web viewables of the model.
    ModelView,
    /// Parameters extracted after processing; the content hash is taken from it.
    Parameters,
    /// Parameters supplied by the caller for an update run.
    InputParameters,
    /// Zipped assembly with all referenced parts.
    OutputModelAssembly,
    /// Single part document.
    OutputModelPart,
    /// Neutral exchange format, only a stepping stone towards [`Self::OutputDerivedFormatB`].
    IntermediateFormatA,
    /// Native authoring format derived from the exchange format.
    OutputDerivedFormatB,
    /// Bill of materials.
    BillOfMaterials,
    /// Drawing sheets rendered for viewing.
    DrawingViewables,
}

impl ArtifactKind {
    /// File extension used for staged objects of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Thumbnail => "png",
            Self::ModelView => "zip",
            Self::Parameters => "json",
            Self::InputParameters => "json",
            Self::OutputModelAssembly => "zip",
            Self::OutputModelPart => "ipt",
            Self::IntermediateFormatA => "sat",
            Self::OutputDerivedFormatB => "rfa",
            Self::BillOfMaterials => "bom.json",
            Self::DrawingViewables => "drawing.pdf",
        }
    }

    /// The model slot a commit promotes for an assembly or a part.
    pub fn model(is_assembly: bool) -> Self {
        if is_assembly {
            Self::OutputModelAssembly
        } else {
            Self::OutputModelPart
        }
    }
}
