//! Work descriptions handed to the external processing pipeline.
//!
//! A bundle is the only thing the pipeline sees of a batch: where to read
//! the source document and the signed URLs it may write its outputs to.

use artifex_store::SignedUrl;
use serde::{Deserialize, Serialize};
use url::Url;

/// Outputs of adopting a source document into a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionBundle {
    /// Source document, a part file or a zipped assembly.
    pub input_doc_url: Url,
    /// Top level assembly inside the source archive, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_level_assembly: Option<String>,
    pub thumbnail: SignedUrl,
    pub model_view: SignedUrl,
    pub parameters: SignedUrl,
    pub output_model_assembly: SignedUrl,
    pub output_model_part: SignedUrl,
    pub bill_of_materials: SignedUrl,
}

/// Outputs of regenerating a project from new parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBundle {
    #[serde(flatten)]
    pub adoption: AdoptionBundle,
    /// Caller supplied parameters, already uploaded; readable and rewritable.
    pub input_parameters: SignedUrl,
}

/// One stage of a derivative format conversion.
///
/// Exactly the URLs of the requested stage are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingBundle {
    pub input_doc_url: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_level_assembly: Option<String>,
    /// Intermediate exchange format, read back by the next stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<SignedUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfa: Option<SignedUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing_viewables: Option<SignedUrl>,
}

impl ProcessingBundle {
    pub(crate) fn new(input_doc_url: Url, top_level_assembly: Option<String>) -> Self {
        Self {
            input_doc_url,
            top_level_assembly,
            sat: None,
            rfa: None,
            drawing_viewables: None,
        }
    }
}
