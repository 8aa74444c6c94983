//! Bucket-scoped object store client.
//!
//! [`ObjectStoreClient`] is a thin, cloneable wrapper around
//! `Arc<dyn ObjectStore>` paired with a [`UrlSigner`]. It exposes exactly the
//! surface the staging layer consumes: signed URL issuance, rename, delete,
//! upload, download and list. Every public method is instrumented with
//! [`tracing`] for observability.

mod object_info;
mod signed_url;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::TryStreamExt;
use jiff::{SignedDuration, Timestamp};
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
pub use object_info::ObjectInfo;
pub use signed_url::{ObjectAccess, SignMethod, SignedUrl};

use crate::signer::UrlSigner;
use crate::{Error, Result, TRACING_TARGET};

/// Cloneable handle to a single bucket of any [`ObjectStore`] backend.
///
/// All methods accept human-readable string keys and convert them to
/// [`object_store::path::Path`] internally.
#[derive(Clone)]
pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
    signer: Arc<dyn UrlSigner>,
}

impl ObjectStoreClient {
    /// Wrap a concrete [`ObjectStore`] and the signer issuing URLs for it.
    pub fn new(store: impl ObjectStore, signer: impl UrlSigner) -> Self {
        Self {
            store: Arc::new(store),
            signer: Arc::new(signer),
        }
    }

    /// Build from already shared handles.
    pub fn from_parts(store: Arc<dyn ObjectStore>, signer: Arc<dyn UrlSigner>) -> Self {
        Self { store, signer }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Issue time-scoped URLs for `key`.
    ///
    /// Read-write access produces both a download and an upload URL; the two
    /// signatures are requested concurrently and either failure fails the call.
    #[tracing::instrument(name = "store.sign", skip(self), fields(key))]
    pub async fn create_signed_url(
        &self,
        key: &str,
        access: ObjectAccess,
        ttl: Duration,
    ) -> Result<SignedUrl> {
        validate_key(key)?;

        let expires_at = SignedDuration::try_from(ttl)
            .ok()
            .and_then(|ttl| Timestamp::now().checked_add(ttl).ok())
            .ok_or_else(|| Error::signing(key, format!("invalid ttl {ttl:?}")))?;

        let read = async {
            if access.allows_read() {
                self.signer.sign(key, SignMethod::Get, ttl).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let write = async {
            if access.allows_write() {
                self.signer.sign(key, SignMethod::Put, ttl).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let (read, write) = futures::try_join!(read, write)?;

        Ok(SignedUrl {
            access,
            read,
            write,
            expires_at,
        })
    }

    /// Move the object at `src` to `dst`.
    ///
    /// Without `overwrite` an existing destination fails the call with
    /// [`Error::AlreadyExists`] and the source is left in place. Backends
    /// without conditional copy fall back to probing the destination first,
    /// which is not atomic.
    #[tracing::instrument(name = "store.rename", skip(self), fields(src, dst, overwrite))]
    pub async fn rename(&self, src: &str, dst: &str, overwrite: bool) -> Result<()> {
        let from = parse_key(src)?;
        let to = parse_key(dst)?;

        let result = if overwrite {
            self.store.rename(&from, &to).await
        } else {
            match self.store.rename_if_not_exists(&from, &to).await {
                Err(object_store::Error::NotSupported { source }) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        dst = %dst,
                        reason = %source,
                        "Conditional copy unsupported, probing destination"
                    );
                    if self.exists(dst).await? {
                        return Err(Error::already_exists(dst));
                    }
                    self.store.rename(&from, &to).await
                }
                result => result,
            }
        };

        result.map_err(|e| match e {
            object_store::Error::AlreadyExists { .. } => Error::already_exists(dst),
            e => Error::from_store("rename", src, e),
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            src = %src,
            dst = %dst,
            "Object renamed"
        );

        Ok(())
    }

    /// Delete the object at `key`.
    ///
    /// Most backends treat deleting a missing key as success; the object is
    /// probed first so a missing key surfaces as [`Error::NotFound`].
    #[tracing::instrument(name = "store.delete", skip(self), fields(key))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = parse_key(key)?;

        self.store
            .head(&path)
            .await
            .map_err(|e| Error::from_store("head", key, e))?;
        self.store
            .delete(&path)
            .await
            .map_err(|e| Error::from_store("delete", key, e))?;

        tracing::debug!(target: TRACING_TARGET, key = %key, "Object deleted");

        Ok(())
    }

    /// Upload `data` to `key`, replacing any existing object.
    #[tracing::instrument(name = "store.upload", skip(self, data), fields(key, size = data.len()))]
    pub async fn upload(&self, key: &str, data: Bytes) -> Result<()> {
        let path = parse_key(key)?;

        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map_err(|e| Error::from_store("put", key, e))?;

        Ok(())
    }

    /// Download the full contents of `key`.
    #[tracing::instrument(name = "store.download", skip(self), fields(key))]
    pub async fn download(&self, key: &str) -> Result<Bytes> {
        let path = parse_key(key)?;

        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| Error::from_store("get", key, e))?;
        let data = result
            .bytes()
            .await
            .map_err(|e| Error::from_store("get", key, e))?;

        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            size = data.len(),
            "Object downloaded"
        );

        Ok(data)
    }

    /// Get object metadata without downloading the body.
    #[tracing::instrument(name = "store.head", skip(self), fields(key))]
    pub async fn head(&self, key: &str) -> Result<ObjectInfo> {
        let path = parse_key(key)?;

        self.store
            .head(&path)
            .await
            .map(ObjectInfo::from)
            .map_err(|e| Error::from_store("head", key, e))
    }

    /// Whether an object exists at `key`.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.head(key).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List every object under `prefix`.
    ///
    /// An empty prefix lists the whole bucket.
    #[tracing::instrument(name = "store.list", skip(self), fields(prefix))]
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let prefix = if prefix.is_empty() {
            None
        } else {
            Some(parse_key(prefix)?)
        };

        let objects: Vec<_> = self
            .store
            .list(prefix.as_ref())
            .map_ok(ObjectInfo::from)
            .try_collect()
            .await
            .map_err(|e| {
                let key = prefix.as_ref().map_or("", |p| p.as_ref());
                Error::from_store("list", key, e)
            })?;

        Ok(objects)
    }
}

impl std::fmt::Debug for ObjectStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreClient")
            .field("store", &self.store.to_string())
            .finish_non_exhaustive()
    }
}

/// Rejects keys that would be silently normalized by [`Path::from`].
fn validate_key(key: &str) -> Result<()> {
    parse_key(key).map(|_| ())
}

fn parse_key(key: &str) -> Result<Path> {
    if key.is_empty() {
        return Err(Error::invalid_key(key, "key is empty"));
    }
    let path = Path::parse(key).map_err(|e| Error::invalid_key(key, e.to_string()))?;
    if path.as_ref() != key {
        return Err(Error::invalid_key(key, "key is not in canonical form"));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use futures::stream::BoxStream;
    use object_store::memory::InMemory;
    use object_store::{
        GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, PutMultipartOptions,
        PutOptions, PutResult,
    };
    use url::Url;

    use super::*;
    use crate::signer::HmacSigner;

    const TTL: Duration = Duration::from_secs(600);

    fn test_signer() -> HmacSigner {
        HmacSigner::new(Url::parse("http://localhost/bucket/").unwrap(), "secret").unwrap()
    }

    fn test_client() -> ObjectStoreClient {
        ObjectStoreClient::new(InMemory::new(), test_signer())
    }

    /// In-memory bucket that rejects `copy_if_not_exists`, as plain S3 does.
    #[derive(Debug)]
    struct NoConditionalCopy(InMemory);

    impl std::fmt::Display for NoConditionalCopy {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "NoConditionalCopy({})", self.0)
        }
    }

    #[async_trait::async_trait]
    impl ObjectStore for NoConditionalCopy {
        async fn put_opts(
            &self,
            location: &Path,
            payload: PutPayload,
            opts: PutOptions,
        ) -> object_store::Result<PutResult> {
            self.0.put_opts(location, payload, opts).await
        }

        async fn put_multipart_opts(
            &self,
            location: &Path,
            opts: PutMultipartOptions,
        ) -> object_store::Result<Box<dyn MultipartUpload>> {
            self.0.put_multipart_opts(location, opts).await
        }

        async fn get_opts(
            &self,
            location: &Path,
            options: GetOptions,
        ) -> object_store::Result<GetResult> {
            self.0.get_opts(location, options).await
        }

        async fn delete(&self, location: &Path) -> object_store::Result<()> {
            self.0.delete(location).await
        }

        fn list(
            &self,
            prefix: Option<&Path>,
        ) -> BoxStream<'static, object_store::Result<ObjectMeta>> {
            self.0.list(prefix)
        }

        async fn list_with_delimiter(
            &self,
            prefix: Option<&Path>,
        ) -> object_store::Result<ListResult> {
            self.0.list_with_delimiter(prefix).await
        }

        async fn copy(&self, from: &Path, to: &Path) -> object_store::Result<()> {
            self.0.copy(from, to).await
        }

        async fn copy_if_not_exists(&self, _from: &Path, _to: &Path) -> object_store::Result<()> {
            Err(object_store::Error::NotSupported {
                source: "copy-if-not-exists disabled".into(),
            })
        }
    }

    #[tokio::test]
    async fn upload_and_download() {
        let client = test_client();
        let data = Bytes::from("hello world");
        client.upload("dir/test.txt", data.clone()).await.unwrap();

        assert_eq!(client.download("dir/test.txt").await.unwrap(), data);
    }

    #[tokio::test]
    async fn download_missing_is_not_found() {
        let client = test_client();
        let err = client.download("missing.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn signed_url_per_access() {
        let client = test_client();

        let write = client
            .create_signed_url("a.png", ObjectAccess::Write, TTL)
            .await
            .unwrap();
        assert!(write.read.is_none());
        assert!(write.write.is_some());

        let read = client
            .create_signed_url("a.png", ObjectAccess::Read, TTL)
            .await
            .unwrap();
        assert!(read.read.is_some());
        assert!(read.write.is_none());

        let both = client
            .create_signed_url("a.png", ObjectAccess::ReadWrite, TTL)
            .await
            .unwrap();
        assert!(both.read.is_some());
        assert!(both.write.is_some());
        assert!(both.expires_at > Timestamp::now());
    }

    #[tokio::test]
    async fn signed_url_rejects_bad_key() {
        let client = test_client();
        let err = client
            .create_signed_url("a//b", ObjectAccess::Write, TTL)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn rename_moves_object() {
        let client = test_client();
        client.upload("src.bin", Bytes::from("x")).await.unwrap();
        client.rename("src.bin", "a/dst.bin", false).await.unwrap();

        assert!(!client.exists("src.bin").await.unwrap());
        assert_eq!(client.download("a/dst.bin").await.unwrap(), Bytes::from("x"));
    }

    #[tokio::test]
    async fn rename_without_overwrite_keeps_destination() {
        let client = test_client();
        client.upload("src.bin", Bytes::from("new")).await.unwrap();
        client.upload("dst.bin", Bytes::from("old")).await.unwrap();

        let err = client.rename("src.bin", "dst.bin", false).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { ref key } if key == "dst.bin"));
        assert_eq!(client.download("dst.bin").await.unwrap(), Bytes::from("old"));
        assert!(client.exists("src.bin").await.unwrap());
    }

    #[tokio::test]
    async fn rename_with_overwrite_replaces_destination() {
        let client = test_client();
        client.upload("src.bin", Bytes::from("new")).await.unwrap();
        client.upload("dst.bin", Bytes::from("old")).await.unwrap();

        client.rename("src.bin", "dst.bin", true).await.unwrap();
        assert_eq!(client.download("dst.bin").await.unwrap(), Bytes::from("new"));
    }

    #[tokio::test]
    async fn rename_missing_source_is_not_found() {
        let client = test_client();
        let err = client.rename("nope.bin", "dst.bin", false).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let client = test_client();
        client.upload("del.bin", Bytes::from("x")).await.unwrap();
        client.delete("del.bin").await.unwrap();

        let err = client.delete("del.bin").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_by_prefix() {
        let client = test_client();
        for i in 0..3 {
            client
                .upload(&format!("dir/file{i}.txt"), Bytes::from(format!("{i}")))
                .await
                .unwrap();
        }
        client.upload("other.txt", Bytes::from("o")).await.unwrap();

        let items = client.list("dir").await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|o| o.key.starts_with("dir/")));
        assert_eq!(client.list("").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn rename_without_conditional_copy_moves_object() {
        let client = ObjectStoreClient::new(NoConditionalCopy(InMemory::new()), test_signer());
        client.upload("staging/a.json", Bytes::from("{}")).await.unwrap();

        client
            .rename("staging/a.json", "cache/p/h/parameters.json", false)
            .await
            .unwrap();
        assert!(!client.exists("staging/a.json").await.unwrap());
        assert_eq!(
            client.download("cache/p/h/parameters.json").await.unwrap(),
            Bytes::from("{}")
        );
    }

    #[tokio::test]
    async fn rename_without_conditional_copy_keeps_destination() {
        let client = ObjectStoreClient::new(NoConditionalCopy(InMemory::new()), test_signer());
        client.upload("src.bin", Bytes::from("new")).await.unwrap();
        client.upload("dst.bin", Bytes::from("old")).await.unwrap();

        let err = client.rename("src.bin", "dst.bin", false).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { ref key } if key == "dst.bin"));
        assert_eq!(client.download("dst.bin").await.unwrap(), Bytes::from("old"));
        assert!(client.exists("src.bin").await.unwrap());
    }
}
