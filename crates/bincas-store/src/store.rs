//! The binary store façade.

use std::sync::Arc;
use std::time::Duration;

use bincas_core::ContentKey;
use bincas_core::content_type::OCTET_STREAM;
use bincas_object::providers::{BucketCredentials, Provider};
use bincas_object::{ObjectReader, ObjectStoreClient};
use bincas_staging::{StagedObject, StagingCache};
use tokio::io::AsyncRead;

use crate::remote::Remote;
use crate::{BinaryHandle, BinaryStoreConfig, Capabilities, Error, Result, TRACING_TARGET_STORE};

/// Content-addressed binary store over a single bucket.
///
/// Cheap to clone; clones share the client, the configuration and the
/// staging cache.
#[derive(Debug, Clone)]
pub struct BinaryStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: BinaryStoreConfig,
    client: ObjectStoreClient,
    staging: StagingCache,
}

impl BinaryStore {
    /// Creates a store over an already connected client.
    ///
    /// An unconfigured bucket is accepted here; every remote operation then
    /// fails with [`Error::Configuration`].
    pub fn new(config: BinaryStoreConfig, client: ObjectStoreClient, staging: StagingCache) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                client,
                staging,
            }),
        }
    }

    /// Connects to the bucket through provider `P`.
    ///
    /// Fails with [`Error::Configuration`] before any connection attempt when
    /// no bucket is configured or the credentials name a different bucket.
    pub async fn connect<P: Provider>(
        config: BinaryStoreConfig,
        credentials: &P::Credentials,
        staging: StagingCache,
    ) -> Result<Self> {
        if !config.is_configured() {
            return Err(Error::configuration("bucket not configured"));
        }
        if credentials.bucket().trim() != config.bucket.trim() {
            return Err(Error::configuration(format!(
                "credentials name bucket '{}' but the store is configured for '{}'",
                credentials.bucket(),
                config.bucket
            )));
        }

        let client = P::connect(credentials).await?.into_client();
        tracing::info!(
            target: TRACING_TARGET_STORE,
            provider = P::ID,
            bucket = %config.bucket,
            "Connected to bucket"
        );
        Ok(Self::new(config, client, staging))
    }

    /// Returns the store configuration.
    #[inline]
    pub fn config(&self) -> &BinaryStoreConfig {
        &self.inner.config
    }

    /// Returns the staging cache.
    #[inline]
    pub fn staging(&self) -> &StagingCache {
        &self.inner.staging
    }

    /// Returns the underlying object client.
    #[inline]
    pub fn client(&self) -> &ObjectStoreClient {
        &self.inner.client
    }

    /// Returns what the bucket supports beyond plain storage.
    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::OBJECT_STORAGE
    }

    fn remote(&self) -> Result<Remote<'_>> {
        if !self.inner.config.is_configured() {
            return Err(Error::configuration("bucket not configured"));
        }
        Ok(Remote::new(&self.inner.client, &self.inner.config.bucket))
    }

    /// Stores the content of `reader` and returns a handle to it.
    ///
    /// The content is staged locally to compute its key, uploaded only when
    /// the bucket does not already hold that key, then released from the
    /// staging area whether or not the upload succeeded.
    pub async fn store<R>(&self, reader: R) -> Result<BinaryHandle>
    where
        R: AsyncRead + Unpin + Send,
    {
        let remote = self.remote()?;
        let staged = self.inner.staging.store(reader).await?;

        let promoted = self.promote(remote, &staged).await;
        self.inner.staging.evict([staged.key()]).await;
        promoted?;

        Ok(BinaryHandle::new(
            self.clone(),
            staged.key().clone(),
            staged.size(),
        ))
    }

    async fn promote(&self, remote: Remote<'_>, staged: &StagedObject) -> Result<()> {
        let key = staged.key();
        if remote.exists(key).await? {
            tracing::warn!(
                target: TRACING_TARGET_STORE,
                bucket = remote.bucket(),
                key = %key,
                "Duplicate upload suppressed"
            );
            return Ok(());
        }

        let data = self.inner.staging.read(key).await?;
        match remote.put_primary(key, data, staged.mime_type()).await {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET_STORE,
                    bucket = remote.bucket(),
                    key = %key,
                    size = staged.size(),
                    mime_type = staged.mime_type(),
                    staged_at = %staged.staged_at(),
                    "Binary stored"
                );
                Ok(())
            }
            Err(err) if err.is_already_exists() => {
                tracing::warn!(
                    target: TRACING_TARGET_STORE,
                    bucket = remote.bucket(),
                    key = %key,
                    "Duplicate upload suppressed by concurrent store"
                );
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Opens a streaming reader over the content stored under `key`.
    ///
    /// Missing content yields an empty reader.
    pub async fn get_input_stream(&self, key: &ContentKey) -> Result<ObjectReader> {
        let remote = self.remote()?;
        match remote.open(key).await? {
            Some(reader) => Ok(reader),
            None => {
                tracing::debug!(
                    target: TRACING_TARGET_STORE,
                    bucket = remote.bucket(),
                    key = %key,
                    "Binary not found, returning empty stream"
                );
                Ok(Box::pin(tokio::io::empty()))
            }
        }
    }

    /// Returns whether content is stored under `key`.
    pub async fn has_binary(&self, key: &ContentKey) -> Result<bool> {
        Ok(self.remote()?.exists(key).await?)
    }

    /// Returns the media type recorded for the content under `key`.
    ///
    /// Unlike the other reads, a missing object is reported as
    /// [`Error::NotFound`].
    pub async fn get_stored_mime_type(&self, key: &ContentKey) -> Result<String> {
        let remote = self.remote()?;
        let head = remote
            .head(key)
            .await?
            .ok_or_else(|| Error::not_found(remote.bucket(), key.to_string()))?;
        Ok(head.content_type.unwrap_or_else(|| OCTET_STREAM.to_owned()))
    }

    /// Accepts a media type for `key` and discards it.
    ///
    /// Stored objects are immutable; see
    /// [`Capabilities::mutable_mime_type`].
    pub async fn store_mime_type(&self, key: &ContentKey, mime_type: &str) -> Result<()> {
        let remote = self.remote()?;
        tracing::info!(
            target: TRACING_TARGET_STORE,
            bucket = remote.bucket(),
            key = %key,
            mime_type,
            "Media type update is not supported, ignoring"
        );
        Ok(())
    }

    /// Stores `text` as the extracted text of `key`, replacing any previous
    /// value.
    pub async fn store_extracted_text(&self, key: &ContentKey, text: &str) -> Result<()> {
        let remote = self.remote()?;
        remote.put_text(key, text).await?;
        tracing::debug!(
            target: TRACING_TARGET_STORE,
            bucket = remote.bucket(),
            key = %key,
            len = text.len(),
            "Extracted text stored"
        );
        Ok(())
    }

    /// Returns the extracted text of `key`, or an empty string when none is
    /// stored.
    pub async fn get_extracted_text(&self, key: &ContentKey) -> Result<String> {
        let remote = self.remote()?;
        Ok(remote.get_text(key).await?.unwrap_or_default())
    }

    /// Accepts an age threshold for garbage collection and does nothing.
    pub fn remove_values_unused_longer_than(&self, age: Duration) {
        tracing::info!(
            target: TRACING_TARGET_STORE,
            age_secs = age.as_secs(),
            "Unused-value collection is not supported, ignoring"
        );
    }

    /// Accepts keys to mark as used and does nothing.
    pub fn mark_as_used<'a, I>(&self, keys: I)
    where
        I: IntoIterator<Item = &'a ContentKey>,
    {
        let count = keys.into_iter().count();
        tracing::debug!(
            target: TRACING_TARGET_STORE,
            count,
            "Usage tracking is not supported, ignoring"
        );
    }

    /// Permanently deletes the content stored under each key.
    ///
    /// Keys with no stored content are ignored. Returns the number of keys
    /// submitted for deletion. Extracted-text sidecars are left in place.
    pub async fn mark_as_unused<'a, I>(&self, keys: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a ContentKey>,
    {
        let remote = self.remote()?;
        let keys: Vec<ContentKey> = keys.into_iter().cloned().collect();
        let count = remote.delete_primaries(&keys).await?;
        tracing::info!(
            target: TRACING_TARGET_STORE,
            bucket = remote.bucket(),
            count,
            "Binaries deleted"
        );
        Ok(count)
    }

    /// Returns every content key stored in the bucket, sorted.
    pub async fn get_all_binary_keys(&self) -> Result<Vec<ContentKey>> {
        let remote = self.remote()?;
        let keys = remote.keys().await?;
        tracing::debug!(
            target: TRACING_TARGET_STORE,
            bucket = remote.bucket(),
            count = keys.len(),
            "Binary keys enumerated"
        );
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use bincas_object::PutAttributes;
    use bincas_object::providers::{GcsCredentials, GcsProvider, S3Credentials, S3Provider};
    use bincas_staging::StagingConfig;
    use bytes::Bytes;
    use object_store::memory::InMemory;
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::{KEY_METADATA, sidecar_name};

    const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";

    fn store_with_bucket(bucket: &str) -> (BinaryStore, ObjectStoreClient) {
        let client = ObjectStoreClient::new(InMemory::new());
        let staging = StagingCache::new(&StagingConfig::default()).unwrap();
        let store = BinaryStore::new(BinaryStoreConfig::new(bucket), client.clone(), staging);
        (store, client)
    }

    fn test_store() -> (BinaryStore, ObjectStoreClient) {
        store_with_bucket("test-bucket")
    }

    async fn read_all(mut reader: ObjectReader) -> Vec<u8> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn store_round_trips_content() {
        let (store, _) = test_store();

        let handle = store.store(PDF).await.unwrap();
        assert_eq!(handle.key(), &ContentKey::digest(PDF));
        assert_eq!(handle.size(), PDF.len() as u64);

        let content = read_all(store.get_input_stream(handle.key()).await.unwrap()).await;
        assert_eq!(content, PDF);
        assert_eq!(read_all(handle.reader().await.unwrap()).await, PDF);
        assert!(store.has_binary(handle.key()).await.unwrap());
    }

    #[tokio::test]
    async fn store_evicts_staged_content() {
        let (store, _) = test_store();

        store.store(PDF).await.unwrap();
        store.store(PDF).await.unwrap();
        assert!(store.staging().is_empty().await);
    }

    #[tokio::test]
    async fn identical_content_is_stored_once() {
        let (store, client) = test_store();

        let first = store.store(&b"same bytes"[..]).await.unwrap();
        let second = store.store(&b"same bytes"[..]).await.unwrap();
        assert_eq!(first.key(), second.key());
        assert_eq!(client.list("").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_stores_converge() {
        let (store, client) = test_store();

        let (a, b) = tokio::join!(store.store(PDF), store.store(PDF));
        assert_eq!(a.unwrap().key(), b.unwrap().key());
        assert_eq!(client.list("").await.unwrap().len(), 1);
        assert!(store.staging().is_empty().await);
    }

    #[tokio::test]
    async fn primary_object_carries_key_and_media_type() {
        let (store, client) = test_store();

        let handle = store.store(PDF).await.unwrap();
        let head = client.head(&handle.key().to_string()).await.unwrap().unwrap();
        assert_eq!(
            head.metadata.get(KEY_METADATA),
            Some(&handle.key().to_string())
        );
        assert_eq!(head.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(handle.mime_type().await.unwrap(), "application/pdf");
    }

    #[tokio::test]
    async fn missing_content_reads_as_empty_stream() {
        let (store, _) = test_store();
        let key = ContentKey::digest(b"never stored");

        let content = read_all(store.get_input_stream(&key).await.unwrap()).await;
        assert!(content.is_empty());
        assert!(!store.has_binary(&key).await.unwrap());
    }

    #[tokio::test]
    async fn stored_mime_type_of_missing_object_is_not_found() {
        let (store, _) = test_store();
        let key = ContentKey::digest(b"never stored");

        let err = store.get_stored_mime_type(&key).await.unwrap_err();
        match err {
            Error::NotFound { bucket, key: missing } => {
                assert_eq!(bucket, "test-bucket");
                assert_eq!(missing, key.to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn stored_mime_type_defaults_to_octet_stream() {
        let (store, client) = test_store();
        let key = ContentKey::digest(b"untyped");
        client
            .put(
                &key.to_string(),
                Bytes::from_static(b"untyped"),
                PutAttributes::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            store.get_stored_mime_type(&key).await.unwrap(),
            OCTET_STREAM
        );
    }

    #[tokio::test]
    async fn extracted_text_lifecycle() {
        let (store, client) = test_store();
        let handle = store.store(PDF).await.unwrap();
        let key = handle.key();

        assert_eq!(store.get_extracted_text(key).await.unwrap(), "");

        store.store_extracted_text(key, "hello").await.unwrap();
        assert_eq!(store.get_extracted_text(key).await.unwrap(), "hello");

        handle.store_extracted_text("world").await.unwrap();
        assert_eq!(handle.extracted_text().await.unwrap(), "world");

        let sidecar = client
            .head(&format!("{key}-MODESHAPE-TEXT"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sidecar.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn extracted_text_does_not_require_primary() {
        let (store, _) = test_store();
        let key = ContentKey::digest(b"orphan");

        store.store_extracted_text(&key, "orphan text").await.unwrap();
        assert_eq!(store.get_extracted_text(&key).await.unwrap(), "orphan text");
        assert!(!store.has_binary(&key).await.unwrap());
        assert!(store.get_all_binary_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn enumeration_lists_each_stored_key_once() {
        let (store, _) = test_store();

        let mut expected = Vec::new();
        for content in [&b"one"[..], b"two", b"three", b"one"] {
            let handle = store.store(content).await.unwrap();
            store
                .store_extracted_text(handle.key(), "text")
                .await
                .unwrap();
            expected.push(handle.key().clone());
        }
        expected.sort();
        expected.dedup();

        assert_eq!(store.get_all_binary_keys().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn enumeration_skips_objects_without_valid_key_metadata() {
        let (store, client) = test_store();
        let handle = store.store(PDF).await.unwrap();

        client
            .put("foreign", Bytes::from_static(b"x"), PutAttributes::default())
            .await
            .unwrap();
        client
            .put(
                "malformed",
                Bytes::from_static(b"y"),
                PutAttributes::default().with_metadata(KEY_METADATA, "not-hex"),
            )
            .await
            .unwrap();

        assert_eq!(
            store.get_all_binary_keys().await.unwrap(),
            vec![handle.key().clone()]
        );
    }

    #[tokio::test]
    async fn mark_as_unused_deletes_content() {
        let (store, client) = test_store();
        let kept = store.store(&b"kept"[..]).await.unwrap();
        let dropped = store.store(&b"dropped"[..]).await.unwrap();
        store
            .store_extracted_text(dropped.key(), "text")
            .await
            .unwrap();
        let unknown = ContentKey::digest(b"unknown");

        let count = store
            .mark_as_unused([dropped.key(), &unknown])
            .await
            .unwrap();
        assert_eq!(count, 2);

        assert!(!store.has_binary(dropped.key()).await.unwrap());
        assert!(read_all(dropped.reader().await.unwrap()).await.is_empty());
        assert_eq!(
            store.get_all_binary_keys().await.unwrap(),
            vec![kept.key().clone()]
        );
        assert!(client.exists(&sidecar_name(dropped.key())).await.unwrap());
    }

    #[tokio::test]
    async fn mark_as_unused_with_no_keys() {
        let (store, _) = test_store();
        let count = store
            .mark_as_unused(std::iter::empty::<&ContentKey>())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn unconfigured_bucket_fails_without_remote_effects() {
        let (store, client) = store_with_bucket("  ");
        client
            .put("existing", Bytes::from_static(b"x"), PutAttributes::default())
            .await
            .unwrap();
        let key = ContentKey::digest(b"existing");

        assert!(store.store(PDF).await.unwrap_err().is_configuration());
        assert!(store.staging().is_empty().await);
        assert!(matches!(store.get_input_stream(&key).await, Err(e) if e.is_configuration()));
        assert!(store.has_binary(&key).await.unwrap_err().is_configuration());
        assert!(store.get_stored_mime_type(&key).await.unwrap_err().is_configuration());
        assert!(store.store_mime_type(&key, "text/plain").await.unwrap_err().is_configuration());
        assert!(store.store_extracted_text(&key, "t").await.unwrap_err().is_configuration());
        assert!(store.get_extracted_text(&key).await.unwrap_err().is_configuration());
        assert!(store.mark_as_unused([&key]).await.unwrap_err().is_configuration());
        assert!(store.get_all_binary_keys().await.unwrap_err().is_configuration());

        let names: Vec<String> = client
            .list("")
            .await
            .unwrap()
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect();
        assert_eq!(names, vec!["existing".to_owned()]);
    }

    #[tokio::test]
    async fn connect_without_bucket_fails_before_connecting() {
        let staging = StagingCache::new(&StagingConfig::default()).unwrap();
        let credentials = GcsCredentials::default();

        let err = BinaryStore::connect::<GcsProvider>(
            BinaryStoreConfig::default(),
            &credentials,
            staging,
        )
        .await
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn connect_with_mismatched_bucket_fails_before_connecting() {
        let staging = StagingCache::new(&StagingConfig::default()).unwrap();
        let credentials = S3Credentials::new("other-bucket");

        let err = BinaryStore::connect::<S3Provider>(
            BinaryStoreConfig::new("test-bucket"),
            &credentials,
            staging,
        )
        .await
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("other-bucket"));
    }

    #[tokio::test]
    async fn connect_with_matching_bucket_succeeds() {
        let staging = StagingCache::new(&StagingConfig::default()).unwrap();
        let credentials = S3Credentials::new("test-bucket")
            .with_endpoint("http://localhost:9000");

        let store = BinaryStore::connect::<S3Provider>(
            BinaryStoreConfig::new("test-bucket"),
            &credentials,
            staging,
        )
        .await
        .unwrap();
        assert_eq!(store.config().bucket, "test-bucket");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores_survive_an_aggressive_sweeper() {
        let client = ObjectStoreClient::new(InMemory::new());
        let staging = StagingCache::new(&StagingConfig::default().with_expiry_secs(0)).unwrap();
        let sweeper = staging.spawn_sweeper(Duration::from_micros(100));
        let store = BinaryStore::new(BinaryStoreConfig::new("test-bucket"), client.clone(), staging);

        let payloads: Vec<Vec<u8>> = (0..200u32)
            .map(|i| format!("payload {i}").repeat(64).into_bytes())
            .collect();
        let results =
            futures::future::join_all(payloads.iter().map(|payload| store.store(&payload[..])))
                .await;
        sweeper.abort();

        for result in results {
            result.unwrap();
        }
        assert_eq!(client.list("").await.unwrap().len(), payloads.len());
        assert!(store.staging().is_empty().await);
    }

    #[tokio::test]
    async fn unsupported_operations_are_accepted() {
        let (store, _) = test_store();
        let handle = store.store(PDF).await.unwrap();

        assert_eq!(
            store.capabilities(),
            Capabilities {
                mutable_mime_type: false,
                usage_tracking: false,
            }
        );

        store
            .store_mime_type(handle.key(), "text/plain")
            .await
            .unwrap();
        assert_eq!(handle.mime_type().await.unwrap(), "application/pdf");

        store.mark_as_used([handle.key()]);
        store.remove_values_unused_longer_than(Duration::ZERO);
        assert!(store.has_binary(handle.key()).await.unwrap());
    }
}
