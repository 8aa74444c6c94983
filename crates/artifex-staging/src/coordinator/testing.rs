//! Hermetic store doubles shared by the coordinator tests.

use std::time::Duration;

use artifex_store::signer::{HmacSigner, UrlSigner};
use artifex_store::{ObjectStoreClient, SignMethod};
use bytes::Bytes;
use object_store::memory::InMemory;
use url::Url;

use super::StagingCoordinator;
use crate::{ArtifactKind, ProjectIdentity, StagingBatch, StagingConfig};

const SIGNING_URL: &str = "http://localhost:8080/objects/";

fn hmac_signer() -> HmacSigner {
    HmacSigner::new(Url::parse(SIGNING_URL).unwrap(), "test-secret").unwrap()
}

/// Signer failing every request for keys ending in `suffix`.
pub(crate) struct FailingSigner {
    inner: HmacSigner,
    suffix: &'static str,
}

#[async_trait::async_trait]
impl UrlSigner for FailingSigner {
    async fn sign(
        &self,
        key: &str,
        method: SignMethod,
        ttl: Duration,
    ) -> artifex_store::Result<Url> {
        if key.ends_with(self.suffix) {
            return Err(artifex_store::Error::signing(key, "injected failure"));
        }
        self.inner.sign(key, method, ttl).await
    }
}

pub(crate) fn memory_client() -> ObjectStoreClient {
    ObjectStoreClient::new(InMemory::new(), hmac_signer())
}

pub(crate) fn coordinator() -> StagingCoordinator {
    StagingCoordinator::new(memory_client(), StagingConfig::default()).unwrap()
}

/// Coordinator whose signer rejects keys ending in `suffix`.
pub(crate) fn failing_coordinator(suffix: &'static str) -> StagingCoordinator {
    let signer = FailingSigner {
        inner: hmac_signer(),
        suffix,
    };
    let client = ObjectStoreClient::new(InMemory::new(), signer);
    StagingCoordinator::new(client, StagingConfig::default()).unwrap()
}

pub(crate) fn project() -> ProjectIdentity {
    ProjectIdentity::new("Wrench").unwrap()
}

pub(crate) fn source() -> Url {
    Url::parse("https://example.com/source/Wrench.zip").unwrap()
}

pub(crate) fn parameters(jaw: &str) -> serde_json::Value {
    serde_json::json!({
        "JawOffset": { "value": jaw, "unit": "mm", "values": [] },
        "WrenchSz": { "value": "\"Small\"", "unit": "Text", "values": [] },
    })
}

/// Writes `data` where the pipeline would have uploaded `kind`.
pub(crate) async fn pipeline_writes(
    coordinator: &StagingCoordinator,
    batch: &StagingBatch,
    kind: ArtifactKind,
    data: impl Into<Bytes>,
) {
    let key = batch.temp_key(kind).unwrap();
    coordinator
        .client()
        .upload(key.as_str(), data.into())
        .await
        .unwrap();
}

/// Keys currently stored, sorted.
pub(crate) async fn stored_keys(coordinator: &StagingCoordinator) -> Vec<String> {
    let mut keys: Vec<_> = coordinator
        .client()
        .list("")
        .await
        .unwrap()
        .into_iter()
        .map(|object| object.key)
        .collect();
    keys.sort();
    keys
}
