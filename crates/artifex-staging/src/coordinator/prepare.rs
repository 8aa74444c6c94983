//! Prepare half: reserve temp keys and hand out signed URLs.

use std::collections::BTreeMap;

use artifex_store::{ObjectAccess, SignedUrl};
use bytes::Bytes;
use serde_json::Value;
use url::Url;

use super::{StagingCoordinator, fanout};
use crate::bundle::{AdoptionBundle, ProcessingBundle, UpdateBundle};
use crate::{
    ArtifactKind, Error, ProjectIdentity, Result, StagingBatch, TRACING_TARGET_PREPARE,
    canonicalize,
};

/// Outputs of adopting or regenerating a model, all upload-only.
const ADOPTION_OUTPUTS: [(ArtifactKind, ObjectAccess); 6] = [
    (ArtifactKind::Thumbnail, ObjectAccess::Write),
    (ArtifactKind::ModelView, ObjectAccess::Write),
    (ArtifactKind::Parameters, ObjectAccess::Write),
    (ArtifactKind::OutputModelAssembly, ObjectAccess::Write),
    (ArtifactKind::OutputModelPart, ObjectAccess::Write),
    (ArtifactKind::BillOfMaterials, ObjectAccess::Write),
];

/// The pipeline reads the caller's parameters and may rewrite them.
const INPUT_PARAMETERS: (ArtifactKind, ObjectAccess) =
    (ArtifactKind::InputParameters, ObjectAccess::ReadWrite);

/// The next conversion stage reads the intermediate format back.
const SAT_OUTPUT: (ArtifactKind, ObjectAccess) =
    (ArtifactKind::IntermediateFormatA, ObjectAccess::ReadWrite);

const RFA_OUTPUT: (ArtifactKind, ObjectAccess) =
    (ArtifactKind::OutputDerivedFormatB, ObjectAccess::Write);

const DRAWING_OUTPUT: (ArtifactKind, ObjectAccess) =
    (ArtifactKind::DrawingViewables, ObjectAccess::Write);

type Issued = BTreeMap<ArtifactKind, SignedUrl>;

impl StagingCoordinator {
    /// Reserves the outputs of adopting a source document.
    ///
    /// Six upload URLs are requested concurrently; if any request fails the
    /// whole call fails, no bundle is returned and the batch is
    /// [`Failed`](crate::StagingState::Failed).
    #[tracing::instrument(
        name = "staging.prepare_create",
        skip_all,
        fields(project = %project, batch = %batch.id())
    )]
    pub async fn prepare_for_create(
        &self,
        batch: &mut StagingBatch,
        project: &ProjectIdentity,
        input_doc_url: Url,
        top_level_assembly: Option<String>,
    ) -> Result<AdoptionBundle> {
        batch.begin_prepare("prepare for create")?;

        let result = async {
            let issued = self.issue(batch, &ADOPTION_OUTPUTS).await?;
            let bundle = adoption_bundle(&issued, input_doc_url, top_level_assembly)?;
            Ok::<_, Error>((bundle, issued))
        }
        .await;

        self.finish_prepare(batch, result)
    }

    /// Reserves the outputs of regenerating a project from `parameters`.
    ///
    /// In addition to the create outputs, the parameters are uploaded to a
    /// read-write input key before any URL leaves this call.
    #[tracing::instrument(
        name = "staging.prepare_update",
        skip_all,
        fields(project = %project, batch = %batch.id())
    )]
    pub async fn prepare_for_update(
        &self,
        batch: &mut StagingBatch,
        project: &ProjectIdentity,
        input_doc_url: Url,
        top_level_assembly: Option<String>,
        parameters: &Value,
    ) -> Result<UpdateBundle> {
        batch.begin_prepare("prepare for update")?;

        let result = async {
            canonicalize(parameters)?;
            let document = Bytes::from(serde_json::to_vec(parameters)?);

            let mut requests = ADOPTION_OUTPUTS.to_vec();
            requests.push(INPUT_PARAMETERS);
            let issued = self.issue(batch, &requests).await?;

            let key = batch.temp_key(ArtifactKind::InputParameters)?;
            self.client.upload(key.as_str(), document).await?;

            tracing::debug!(
                target: TRACING_TARGET_PREPARE,
                key = %key,
                "Input parameters uploaded"
            );

            let bundle = UpdateBundle {
                adoption: adoption_bundle(&issued, input_doc_url, top_level_assembly)?,
                input_parameters: issued_url(&issued, ArtifactKind::InputParameters)?,
            };
            Ok::<_, Error>((bundle, issued))
        }
        .await;

        self.finish_prepare(batch, result)
    }

    /// Reserves the intermediate exchange format of a conversion.
    #[tracing::instrument(
        name = "staging.prepare_sat",
        skip_all,
        fields(batch = %batch.id())
    )]
    pub async fn prepare_for_sat(
        &self,
        batch: &mut StagingBatch,
        input_doc_url: Url,
        top_level_assembly: Option<String>,
    ) -> Result<ProcessingBundle> {
        batch.begin_prepare("prepare for sat")?;

        let result = async {
            let issued = self.issue(batch, &[SAT_OUTPUT]).await?;
            let mut bundle = ProcessingBundle::new(input_doc_url, top_level_assembly);
            bundle.sat = issued.get(&SAT_OUTPUT.0).cloned();
            Ok::<_, Error>((bundle, issued))
        }
        .await;

        self.finish_prepare(batch, result)
    }

    /// Reserves the native format derived from the intermediate one.
    #[tracing::instrument(
        name = "staging.prepare_rfa",
        skip_all,
        fields(batch = %batch.id())
    )]
    pub async fn prepare_for_rfa(
        &self,
        batch: &mut StagingBatch,
        input_doc_url: Url,
    ) -> Result<ProcessingBundle> {
        batch.begin_prepare("prepare for rfa")?;

        let result = async {
            let issued = self.issue(batch, &[RFA_OUTPUT]).await?;
            let mut bundle = ProcessingBundle::new(input_doc_url, None);
            bundle.rfa = issued.get(&RFA_OUTPUT.0).cloned();
            Ok::<_, Error>((bundle, issued))
        }
        .await;

        self.finish_prepare(batch, result)
    }

    /// Reserves the drawing viewables of a model.
    #[tracing::instrument(
        name = "staging.prepare_drawing",
        skip_all,
        fields(batch = %batch.id())
    )]
    pub async fn prepare_for_drawing_viewables(
        &self,
        batch: &mut StagingBatch,
        input_doc_url: Url,
        top_level_assembly: Option<String>,
    ) -> Result<ProcessingBundle> {
        batch.begin_prepare("prepare for drawing viewables")?;

        let result = async {
            let issued = self.issue(batch, &[DRAWING_OUTPUT]).await?;
            let mut bundle = ProcessingBundle::new(input_doc_url, top_level_assembly);
            bundle.drawing_viewables = issued.get(&DRAWING_OUTPUT.0).cloned();
            Ok::<_, Error>((bundle, issued))
        }
        .await;

        self.finish_prepare(batch, result)
    }

    /// Requests URLs for every `(kind, access)` pair concurrently.
    async fn issue(
        &self,
        batch: &StagingBatch,
        requests: &[(ArtifactKind, ObjectAccess)],
    ) -> Result<Issued> {
        let ttl = self.config.signed_url_ttl();

        let futures = requests.iter().map(|&(kind, access)| async move {
            let key = batch.temp_key(kind)?;
            let url = self
                .client
                .create_signed_url(key.as_str(), access, ttl)
                .await?;
            Ok::<_, Error>((kind, url))
        });

        let issued = fanout::join_all("issue signed urls", futures).await?;
        Ok(issued.into_iter().collect())
    }

    /// Records the issued URLs and settles the batch state.
    fn finish_prepare<B>(
        &self,
        batch: &mut StagingBatch,
        result: Result<(B, Issued)>,
    ) -> Result<B> {
        let result = result.map(|(bundle, issued)| {
            let count = issued.len();
            for (kind, url) in issued {
                batch.record(kind, url);
            }
            (bundle, count)
        });
        batch.settle(&result);

        let (bundle, count) = result?;
        tracing::debug!(
            target: TRACING_TARGET_PREPARE,
            batch = %batch.id(),
            urls = count,
            "Batch handed to pipeline"
        );
        Ok(bundle)
    }
}

fn issued_url(issued: &Issued, kind: ArtifactKind) -> Result<SignedUrl> {
    issued
        .get(&kind)
        .cloned()
        .ok_or_else(|| Error::missing_artifact(kind))
}

fn adoption_bundle(
    issued: &Issued,
    input_doc_url: Url,
    top_level_assembly: Option<String>,
) -> Result<AdoptionBundle> {
    let get = |kind| issued_url(issued, kind);

    Ok(AdoptionBundle {
        input_doc_url,
        top_level_assembly: top_level_assembly.filter(|name| !name.is_empty()),
        thumbnail: get(ArtifactKind::Thumbnail)?,
        model_view: get(ArtifactKind::ModelView)?,
        parameters: get(ArtifactKind::Parameters)?,
        output_model_assembly: get(ArtifactKind::OutputModelAssembly)?,
        output_model_part: get(ArtifactKind::OutputModelPart)?,
        bill_of_materials: get(ArtifactKind::BillOfMaterials)?,
    })
}
