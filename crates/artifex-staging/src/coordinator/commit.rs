//! Commit half: hash the produced parameters and promote staged objects.
//!
//! Promotion into the hash tier never replaces an existing object: a
//! version's content is fixed by its hash, so when the canonical key is
//! already taken the stored object is kept and the staged duplicate is
//! dropped. Pointer-tier objects and drawing viewables are overwritten.

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{StagingCoordinator, fanout};
use crate::naming::{CanonicalKeySet, ProjectKeys};
use crate::{
    ArtifactKind, ContentHash, Error, ProjectIdentity, ProjectMetadata, Result, StagingBatch,
    TRACING_TARGET_COMMIT, TempKey,
};

impl StagingCoordinator {
    /// Promotes the outputs of a create or update run.
    ///
    /// The content hash is computed from the staged parameters and the model
    /// variant is taken from whichever model slot the pipeline populated.
    /// Thumbnail, model view, bill of materials, parameters and model are
    /// renamed and the metadata record is written, all concurrently.
    /// Returns the hash the project now points at.
    #[tracing::instrument(
        name = "staging.commit_create",
        skip_all,
        fields(project = %project, batch = %batch.id())
    )]
    pub async fn commit_create_or_update(
        &self,
        batch: &mut StagingBatch,
        project: &ProjectIdentity,
        top_level_assembly: Option<String>,
    ) -> Result<ContentHash> {
        batch.begin_commit("commit create or update")?;
        let result = self.promote_project(batch, project, top_level_assembly).await;
        batch.settle(&result);
        result
    }

    /// Promotes regenerated view-layer outputs and drops the input parameters.
    ///
    /// The project metadata record and thumbnail are left untouched.
    #[tracing::instrument(
        name = "staging.commit_viewables",
        skip_all,
        fields(project = %project, batch = %batch.id(), is_assembly = is_assembly)
    )]
    pub async fn commit_viewables_only(
        &self,
        batch: &mut StagingBatch,
        project: &ProjectIdentity,
        is_assembly: bool,
    ) -> Result<ContentHash> {
        batch.begin_commit("commit viewables")?;
        let result = self.promote_viewables(batch, project, is_assembly).await;
        batch.settle(&result);
        result
    }

    /// Promotes the derived native format of an already committed version.
    ///
    /// The intermediate exchange format has no canonical form and is deleted.
    #[tracing::instrument(
        name = "staging.commit_rfa",
        skip_all,
        fields(project = %project, batch = %batch.id(), hash = %hash)
    )]
    pub async fn commit_rfa(
        &self,
        batch: &mut StagingBatch,
        project: &ProjectIdentity,
        hash: &ContentHash,
    ) -> Result<()> {
        batch.begin_commit("commit rfa")?;

        let result = async {
            let rfa = batch.staged_key(ArtifactKind::OutputDerivedFormatB)?;
            let sat = batch.staged_key(ArtifactKind::IntermediateFormatA)?;
            let canonical = CanonicalKeySet::derive(project, hash, false);

            let operations: Vec<BoxFuture<'_, Result<()>>> = vec![
                self.promote(rfa, &canonical.rfa).boxed(),
                self.discard(sat).boxed(),
            ];
            fanout::join_all("commit rfa", operations).await?;

            tracing::info!(
                target: TRACING_TARGET_COMMIT,
                project = %project,
                hash = %hash,
                key = %canonical.rfa,
                "Derived format committed"
            );
            Ok::<_, Error>(())
        }
        .await;

        batch.settle(&result);
        result
    }

    /// Promotes drawing viewables for `hash`, replacing earlier ones.
    #[tracing::instrument(
        name = "staging.commit_drawing",
        skip_all,
        fields(project = %project, batch = %batch.id(), hash = %hash)
    )]
    pub async fn commit_drawing_viewables(
        &self,
        batch: &mut StagingBatch,
        project: &ProjectIdentity,
        hash: &ContentHash,
    ) -> Result<()> {
        batch.begin_commit("commit drawing viewables")?;

        let result = async {
            let staged = batch.staged_key(ArtifactKind::DrawingViewables)?;
            let canonical = CanonicalKeySet::derive(project, hash, false);

            self.client
                .rename(staged.as_str(), &canonical.drawing_viewables, true)
                .await?;

            tracing::info!(
                target: TRACING_TARGET_COMMIT,
                project = %project,
                hash = %hash,
                key = %canonical.drawing_viewables,
                "Drawing viewables committed"
            );
            Ok::<_, Error>(())
        }
        .await;

        batch.settle(&result);
        result
    }

    async fn promote_project(
        &self,
        batch: &StagingBatch,
        project: &ProjectIdentity,
        top_level_assembly: Option<String>,
    ) -> Result<ContentHash> {
        let thumbnail = batch.staged_key(ArtifactKind::Thumbnail)?;
        let model_view = batch.staged_key(ArtifactKind::ModelView)?;
        let bom = batch.staged_key(ArtifactKind::BillOfMaterials)?;
        let parameters = batch.staged_key(ArtifactKind::Parameters)?;

        let hash = self.compute_hash(parameters).await?;
        let is_assembly = self.detect_assembly(batch).await?;
        let model = batch.staged_key(ArtifactKind::model(is_assembly))?;

        let canonical = CanonicalKeySet::derive(project, &hash, is_assembly);
        let pointers = ProjectKeys::derive(project);
        let metadata = ProjectMetadata::new(hash.clone(), top_level_assembly, is_assembly);
        let document = metadata.to_bytes()?;

        let operations: Vec<BoxFuture<'_, Result<()>>> = vec![
            self.replace(thumbnail, &pointers.thumbnail).boxed(),
            self.promote(model_view, &canonical.model_view).boxed(),
            self.promote(bom, &canonical.bom).boxed(),
            self.promote(parameters, &canonical.parameters).boxed(),
            self.promote(model, &canonical.current_model).boxed(),
            async { Ok::<_, Error>(self.client.upload(&pointers.metadata, document).await?) }
                .boxed(),
        ];
        fanout::join_all("commit create or update", operations).await?;

        tracing::info!(
            target: TRACING_TARGET_COMMIT,
            project = %project,
            hash = %hash,
            is_assembly,
            "Project version committed"
        );

        Ok(hash)
    }

    async fn promote_viewables(
        &self,
        batch: &StagingBatch,
        project: &ProjectIdentity,
        is_assembly: bool,
    ) -> Result<ContentHash> {
        let model_view = batch.staged_key(ArtifactKind::ModelView)?;
        let bom = batch.staged_key(ArtifactKind::BillOfMaterials)?;
        let parameters = batch.staged_key(ArtifactKind::Parameters)?;
        let model = batch.staged_key(ArtifactKind::model(is_assembly))?;
        let input_parameters = batch.staged_key(ArtifactKind::InputParameters)?;

        let hash = self.compute_hash(parameters).await?;
        let canonical = CanonicalKeySet::derive(project, &hash, is_assembly);

        let operations: Vec<BoxFuture<'_, Result<()>>> = vec![
            self.promote(model_view, &canonical.model_view).boxed(),
            self.promote(bom, &canonical.bom).boxed(),
            self.promote(parameters, &canonical.parameters).boxed(),
            self.promote(model, &canonical.current_model).boxed(),
            self.discard(input_parameters).boxed(),
        ];
        fanout::join_all("commit viewables", operations).await?;

        tracing::info!(
            target: TRACING_TARGET_COMMIT,
            project = %project,
            hash = %hash,
            is_assembly,
            "Viewables committed"
        );

        Ok(hash)
    }

    /// Downloads and hashes the staged parameters.
    ///
    /// A missing or malformed document is fatal; no hash is made up for it.
    async fn compute_hash(&self, key: &TempKey) -> Result<ContentHash> {
        let bytes = match self.client.download(key.as_str()).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                return Err(Error::hash_computation(
                    key.as_str(),
                    "parameters were not produced",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let hash = ContentHash::from_slice(&bytes)
            .map_err(|e| Error::hash_computation(key.as_str(), e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET_COMMIT,
            key = %key,
            hash = %hash,
            "Content hash computed"
        );

        Ok(hash)
    }

    /// Whether the pipeline produced an assembly, judged by which model slot
    /// it populated. An assembly wins if both were written.
    async fn detect_assembly(&self, batch: &StagingBatch) -> Result<bool> {
        let assembly = batch.staged_key(ArtifactKind::OutputModelAssembly)?;
        let part = batch.staged_key(ArtifactKind::OutputModelPart)?;

        let (has_assembly, has_part) = futures::try_join!(
            self.client.exists(assembly.as_str()),
            self.client.exists(part.as_str()),
        )?;

        match (has_assembly, has_part) {
            (true, _) => Ok(true),
            (false, true) => Ok(false),
            (false, false) => Err(Error::missing_artifact(ArtifactKind::OutputModelPart)),
        }
    }

    /// Moves a staged object into the immutable hash tier.
    async fn promote(&self, staged: &TempKey, canonical: &str) -> Result<()> {
        match self.client.rename(staged.as_str(), canonical, false).await {
            Ok(()) => Ok(()),
            Err(artifex_store::Error::AlreadyExists { .. }) => {
                tracing::debug!(
                    target: TRACING_TARGET_COMMIT,
                    key = %canonical,
                    "Canonical object exists, reusing it"
                );
                self.discard(staged).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Moves a staged object to a mutable pointer key.
    async fn replace(&self, staged: &TempKey, pointer: &str) -> Result<()> {
        Ok(self.client.rename(staged.as_str(), pointer, true).await?)
    }

    async fn discard(&self, staged: &TempKey) -> Result<()> {
        Ok(self.client.delete(staged.as_str()).await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::StagingState;
    use crate::coordinator::testing::{
        coordinator, parameters, pipeline_writes, project, source, stored_keys,
    };

    /// Prepares a create batch and writes the outputs of a part run.
    async fn staged_part_run(coordinator: &StagingCoordinator, jaw: &str) -> StagingBatch {
        let mut batch = StagingBatch::new();
        coordinator
            .prepare_for_create(&mut batch, &project(), source(), None)
            .await
            .unwrap();

        let params = serde_json::to_vec(&parameters(jaw)).unwrap();
        pipeline_writes(coordinator, &batch, ArtifactKind::Thumbnail, "png").await;
        pipeline_writes(coordinator, &batch, ArtifactKind::ModelView, "svf").await;
        pipeline_writes(coordinator, &batch, ArtifactKind::BillOfMaterials, "bom").await;
        pipeline_writes(coordinator, &batch, ArtifactKind::Parameters, params).await;
        pipeline_writes(coordinator, &batch, ArtifactKind::OutputModelPart, jaw.to_owned()).await;
        batch
    }

    #[tokio::test]
    async fn part_create_flow() {
        let coordinator = coordinator();
        let mut batch = staged_part_run(&coordinator, "10 mm").await;

        let hash = coordinator
            .commit_create_or_update(&mut batch, &project(), None)
            .await
            .unwrap();

        assert_eq!(hash, ContentHash::of(&parameters("10 mm")).unwrap());
        assert_eq!(batch.state(), StagingState::Done);

        let p = format!("cache/Wrench/{hash}");
        let mut expected = vec![
            "attributes/Wrench/metadata.json".to_owned(),
            "attributes/Wrench/thumbnail.png".to_owned(),
            format!("{p}/bom.json"),
            format!("{p}/model-view.zip"),
            format!("{p}/model.ipt"),
            format!("{p}/parameters.json"),
        ];
        expected.sort();
        // no assembly model and no staged leftovers
        assert_eq!(stored_keys(&coordinator).await, expected);

        let metadata = coordinator.load_metadata(&project()).await.unwrap().unwrap();
        assert_eq!(metadata, ProjectMetadata::new(hash, None, false));
    }

    #[tokio::test]
    async fn assembly_create_flow() {
        let coordinator = coordinator();
        let mut batch = StagingBatch::new();
        coordinator
            .prepare_for_create(&mut batch, &project(), source(), Some("Wrench.iam".into()))
            .await
            .unwrap();

        let params = serde_json::to_vec(&parameters("5 mm")).unwrap();
        for kind in [
            ArtifactKind::Thumbnail,
            ArtifactKind::ModelView,
            ArtifactKind::BillOfMaterials,
            ArtifactKind::OutputModelAssembly,
        ] {
            pipeline_writes(&coordinator, &batch, kind, "data").await;
        }
        pipeline_writes(&coordinator, &batch, ArtifactKind::Parameters, params).await;

        let hash = coordinator
            .commit_create_or_update(&mut batch, &project(), Some("Wrench.iam".into()))
            .await
            .unwrap();

        let client = coordinator.client();
        assert!(client.exists(&format!("cache/Wrench/{hash}/model.zip")).await.unwrap());
        assert!(!client.exists(&format!("cache/Wrench/{hash}/model.ipt")).await.unwrap());

        let metadata = coordinator.load_metadata(&project()).await.unwrap().unwrap();
        assert!(metadata.is_assembly);
        assert_eq!(metadata.top_level_assembly.as_deref(), Some("Wrench.iam"));
    }

    #[tokio::test]
    async fn missing_parameters_fail_the_commit() {
        let coordinator = coordinator();
        let mut batch = StagingBatch::new();
        coordinator
            .prepare_for_create(&mut batch, &project(), source(), None)
            .await
            .unwrap();
        pipeline_writes(&coordinator, &batch, ArtifactKind::OutputModelPart, "ipt").await;

        let result = coordinator
            .commit_create_or_update(&mut batch, &project(), None)
            .await;

        assert!(matches!(result, Err(Error::HashComputation { .. })));
        assert_eq!(batch.state(), StagingState::Failed);
        assert_eq!(coordinator.load_metadata(&project()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_parameters_fail_the_commit() {
        let coordinator = coordinator();
        let mut batch = StagingBatch::new();
        coordinator
            .prepare_for_create(&mut batch, &project(), source(), None)
            .await
            .unwrap();
        pipeline_writes(&coordinator, &batch, ArtifactKind::Parameters, "{\"p\": 1}").await;

        let result = coordinator
            .commit_create_or_update(&mut batch, &project(), None)
            .await;
        assert!(matches!(result, Err(Error::HashComputation { .. })));
    }

    #[tokio::test]
    async fn partial_failure_leaves_siblings_promoted() {
        let coordinator = coordinator();
        let mut batch = StagingBatch::new();
        coordinator
            .prepare_for_create(&mut batch, &project(), source(), None)
            .await
            .unwrap();

        // the pipeline never uploads the bill of materials
        let params = serde_json::to_vec(&parameters("10 mm")).unwrap();
        pipeline_writes(&coordinator, &batch, ArtifactKind::Thumbnail, "png").await;
        pipeline_writes(&coordinator, &batch, ArtifactKind::ModelView, "svf").await;
        pipeline_writes(&coordinator, &batch, ArtifactKind::Parameters, params).await;
        pipeline_writes(&coordinator, &batch, ArtifactKind::OutputModelPart, "ipt").await;

        let error = coordinator
            .commit_create_or_update(&mut batch, &project(), None)
            .await
            .unwrap_err();

        assert!(error.is_not_found());
        assert_eq!(batch.state(), StagingState::Failed);

        let hash = ContentHash::of(&parameters("10 mm")).unwrap();
        let client = coordinator.client();
        assert!(client.exists(&format!("cache/Wrench/{hash}/model-view.zip")).await.unwrap());
        assert!(client.exists(&format!("cache/Wrench/{hash}/model.ipt")).await.unwrap());
        assert!(!client.exists(&format!("cache/Wrench/{hash}/bom.json")).await.unwrap());
        assert!(coordinator.load_metadata(&project()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn converged_versions_reuse_canonical_objects() {
        let coordinator = coordinator();

        let mut first = staged_part_run(&coordinator, "10 mm").await;
        let hash = coordinator
            .commit_create_or_update(&mut first, &project(), None)
            .await
            .unwrap();
        let model_key = format!("cache/Wrench/{hash}/model.ipt");
        let before = coordinator.client().download(&model_key).await.unwrap();

        let mut second = staged_part_run(&coordinator, "10 mm").await;
        pipeline_writes(&coordinator, &second, ArtifactKind::OutputModelPart, "rebuilt").await;
        let again = coordinator
            .commit_create_or_update(&mut second, &project(), Some("Other.iam".into()))
            .await
            .unwrap();

        assert_eq!(again, hash);
        assert_eq!(coordinator.client().download(&model_key).await.unwrap(), before);
        assert!(
            stored_keys(&coordinator)
                .await
                .iter()
                .all(|key| !key.starts_with("staging/"))
        );

        // the pointer follows the last commit
        let metadata = coordinator.load_metadata(&project()).await.unwrap().unwrap();
        assert_eq!(metadata.top_level_assembly.as_deref(), Some("Other.iam"));
    }

    #[tokio::test]
    async fn viewables_only_flow_drops_input_parameters() {
        let coordinator = coordinator();
        let mut batch = StagingBatch::new();
        let params = parameters("12 mm");
        coordinator
            .prepare_for_update(&mut batch, &project(), source(), None, &params)
            .await
            .unwrap();

        let produced = serde_json::to_vec(&params).unwrap();
        pipeline_writes(&coordinator, &batch, ArtifactKind::ModelView, "svf").await;
        pipeline_writes(&coordinator, &batch, ArtifactKind::BillOfMaterials, "bom").await;
        pipeline_writes(&coordinator, &batch, ArtifactKind::Parameters, produced).await;
        pipeline_writes(&coordinator, &batch, ArtifactKind::OutputModelAssembly, "iam").await;

        let hash = coordinator
            .commit_viewables_only(&mut batch, &project(), true)
            .await
            .unwrap();

        let p = format!("cache/Wrench/{hash}");
        let mut expected = vec![
            format!("{p}/bom.json"),
            format!("{p}/model-view.zip"),
            format!("{p}/model.zip"),
            format!("{p}/parameters.json"),
        ];
        expected.sort();
        assert_eq!(stored_keys(&coordinator).await, expected);
        assert_eq!(coordinator.load_metadata(&project()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn viewables_only_requires_an_update_batch() {
        let coordinator = coordinator();
        let mut batch = staged_part_run(&coordinator, "10 mm").await;

        let result = coordinator
            .commit_viewables_only(&mut batch, &project(), false)
            .await;
        assert!(matches!(
            result,
            Err(Error::MissingArtifact {
                kind: ArtifactKind::InputParameters
            })
        ));
    }

    #[tokio::test]
    async fn rfa_flow_removes_intermediate_format() {
        let coordinator = coordinator();
        let hash = ContentHash::of(&parameters("10 mm")).unwrap();
        let mut batch = StagingBatch::new();

        coordinator
            .prepare_for_sat(&mut batch, source(), None)
            .await
            .unwrap();
        pipeline_writes(&coordinator, &batch, ArtifactKind::IntermediateFormatA, "sat").await;
        coordinator
            .prepare_for_rfa(&mut batch, source())
            .await
            .unwrap();
        pipeline_writes(&coordinator, &batch, ArtifactKind::OutputDerivedFormatB, "rfa").await;

        let sat_key = batch
            .temp_key(ArtifactKind::IntermediateFormatA)
            .unwrap()
            .to_string();
        let before = stored_keys(&coordinator).await;
        assert!(before.contains(&sat_key));

        coordinator
            .commit_rfa(&mut batch, &project(), &hash)
            .await
            .unwrap();

        let after = stored_keys(&coordinator).await;
        assert_eq!(after, vec![format!("cache/Wrench/{hash}/result.rfa")]);
        assert!(!after.contains(&sat_key));
    }

    #[tokio::test]
    async fn drawing_rederivation_overwrites() {
        let coordinator = coordinator();
        let hash = ContentHash::of(&parameters("10 mm")).unwrap();
        let key = format!("cache/Wrench/{hash}/drawing-viewables.pdf");

        for content in ["first", "second"] {
            let mut batch = StagingBatch::new();
            coordinator
                .prepare_for_drawing_viewables(&mut batch, source(), None)
                .await
                .unwrap();
            pipeline_writes(&coordinator, &batch, ArtifactKind::DrawingViewables, content).await;

            coordinator
                .commit_drawing_viewables(&mut batch, &project(), &hash)
                .await
                .unwrap();
            assert_eq!(batch.state(), StagingState::Done);
            assert_eq!(coordinator.client().download(&key).await.unwrap(), content);
        }
    }

    #[tokio::test]
    async fn commits_require_a_prepared_batch() {
        let coordinator = coordinator();
        let hash = ContentHash::of(&json!({})).unwrap();

        let mut fresh = StagingBatch::new();
        let result = coordinator.commit_rfa(&mut fresh, &project(), &hash).await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));

        let mut batch = staged_part_run(&coordinator, "10 mm").await;
        coordinator
            .commit_create_or_update(&mut batch, &project(), None)
            .await
            .unwrap();
        let again = coordinator
            .commit_create_or_update(&mut batch, &project(), None)
            .await;
        assert!(matches!(
            again,
            Err(Error::InvalidState {
                state: StagingState::Done,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn commit_checks_what_was_staged() {
        let coordinator = coordinator();
        let hash = ContentHash::of(&json!({})).unwrap();
        let mut batch = StagingBatch::new();
        coordinator
            .prepare_for_drawing_viewables(&mut batch, source(), None)
            .await
            .unwrap();

        let result = coordinator.commit_rfa(&mut batch, &project(), &hash).await;
        assert!(matches!(result, Err(Error::MissingArtifact { .. })));
        assert_eq!(batch.state(), StagingState::Failed);
    }

    #[tokio::test]
    async fn concurrent_runs_do_not_interfere() {
        let coordinator = coordinator();

        let runs = ["1 mm", "2 mm", "3 mm", "4 mm"].map(|jaw| {
            let coordinator = coordinator.clone();
            async move {
                let project = ProjectIdentity::new(format!("Wrench-{jaw}")).unwrap();
                let mut batch = StagingBatch::new();
                coordinator
                    .prepare_for_create(&mut batch, &project, source(), None)
                    .await?;
                let params = serde_json::to_vec(&parameters(jaw))?;
                let client = coordinator.client();
                for kind in [
                    ArtifactKind::Thumbnail,
                    ArtifactKind::ModelView,
                    ArtifactKind::BillOfMaterials,
                    ArtifactKind::OutputModelPart,
                ] {
                    client.upload(batch.temp_key(kind)?.as_str(), "x".into()).await?;
                }
                client
                    .upload(batch.temp_key(ArtifactKind::Parameters)?.as_str(), params.into())
                    .await?;
                coordinator
                    .commit_create_or_update(&mut batch, &project, None)
                    .await
            }
        });

        let hashes = futures::future::try_join_all(runs).await.unwrap();
        for (hash, jaw) in hashes.iter().zip(["1 mm", "2 mm", "3 mm", "4 mm"]) {
            assert_eq!(hash, &ContentHash::of(&parameters(jaw)).unwrap());
        }
        assert_eq!(stored_keys(&coordinator).await.len(), 4 * 6);
    }
}
