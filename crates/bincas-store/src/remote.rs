//! Bucket-scoped view over the object client.
//!
//! A [`Remote`] is only obtainable through
//! [`BinaryStore::remote`](crate::BinaryStore), which refuses to hand one out
//! while the bucket is unconfigured. Every remote read and write goes
//! through here.

use bincas_core::ContentKey;
use bincas_core::content_type::TEXT_PLAIN;
use bincas_object::{Error, HeadOutput, ObjectReader, ObjectStoreClient, PutAttributes, PutMode};
use bytes::Bytes;
use futures::TryStreamExt;

use crate::TRACING_TARGET_STORE;

/// Suffix appended (after a `-`) to a key to name its extracted-text sidecar.
pub const EXTRACTED_TEXT_SUFFIX: &str = "MODESHAPE-TEXT";

/// User-metadata field holding the content key of a primary object.
pub const KEY_METADATA: &str = "key";

/// Head lookups issued concurrently while enumerating the bucket.
const ENUMERATE_CONCURRENCY: usize = 16;

/// Object name of the primary object for `key`.
pub fn primary_name(key: &ContentKey) -> String {
    key.to_string()
}

/// Object name of the extracted-text sidecar for `key`.
pub fn sidecar_name(key: &ContentKey) -> String {
    format!("{key}-{EXTRACTED_TEXT_SUFFIX}")
}

fn is_sidecar(name: &str) -> bool {
    name.strip_suffix(EXTRACTED_TEXT_SUFFIX)
        .is_some_and(|rest| rest.ends_with('-'))
}

#[derive(Clone, Copy)]
pub(crate) struct Remote<'a> {
    client: &'a ObjectStoreClient,
    bucket: &'a str,
}

impl<'a> Remote<'a> {
    pub(crate) fn new(client: &'a ObjectStoreClient, bucket: &'a str) -> Self {
        Self { client, bucket }
    }

    pub(crate) fn bucket(&self) -> &'a str {
        self.bucket
    }

    pub(crate) async fn exists(&self, key: &ContentKey) -> Result<bool, Error> {
        self.client.exists(&primary_name(key)).await
    }

    /// Create-only upload of a primary object tagged with its key.
    ///
    /// Losing a race to an identical upload surfaces as
    /// [`Error::is_already_exists`].
    pub(crate) async fn put_primary(
        &self,
        key: &ContentKey,
        data: Bytes,
        mime_type: &str,
    ) -> Result<(), Error> {
        let attributes = PutAttributes::default()
            .with_content_type(mime_type)
            .with_metadata(KEY_METADATA, key.to_string());
        self.client
            .put_opts(&primary_name(key), data, PutMode::Create, attributes)
            .await?;
        Ok(())
    }

    pub(crate) async fn open(&self, key: &ContentKey) -> Result<Option<ObjectReader>, Error> {
        self.client.open(&primary_name(key)).await
    }

    pub(crate) async fn head(&self, key: &ContentKey) -> Result<Option<HeadOutput>, Error> {
        self.client.head(&primary_name(key)).await
    }

    pub(crate) async fn put_text(&self, key: &ContentKey, text: &str) -> Result<(), Error> {
        let attributes = PutAttributes::default().with_content_type(TEXT_PLAIN);
        self.client
            .put(
                &sidecar_name(key),
                Bytes::copy_from_slice(text.as_bytes()),
                attributes,
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn get_text(&self, key: &ContentKey) -> Result<Option<String>, Error> {
        let output = self.client.get(&sidecar_name(key)).await?;
        Ok(output.map(|o| String::from_utf8_lossy(&o.data).into_owned()))
    }

    pub(crate) async fn delete_primaries(&self, keys: &[ContentKey]) -> Result<usize, Error> {
        self.client
            .delete_many(keys.iter().map(primary_name))
            .await
    }

    /// Every content key recorded in primary-object metadata.
    ///
    /// Sidecars are skipped by name. Objects whose metadata is missing or
    /// does not parse are skipped with a warning.
    pub(crate) async fn keys(&self) -> Result<Vec<ContentKey>, Error> {
        let client = self.client;
        let heads: Vec<(String, Option<HeadOutput>)> = client
            .list_stream("")
            .try_filter(|meta| futures::future::ready(!is_sidecar(meta.location.as_ref())))
            .map_ok(|meta| async move {
                let name = meta.location.to_string();
                let head = client.head(&name).await?;
                Ok::<_, Error>((name, head))
            })
            .try_buffer_unordered(ENUMERATE_CONCURRENCY)
            .try_collect()
            .await?;

        let mut keys: Vec<ContentKey> = heads
            .into_iter()
            .filter_map(|(name, head)| self.key_of(&name, head?))
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    fn key_of(&self, name: &str, head: HeadOutput) -> Option<ContentKey> {
        let Some(value) = head.metadata.get(KEY_METADATA) else {
            tracing::warn!(
                target: TRACING_TARGET_STORE,
                bucket = self.bucket,
                object = name,
                "Object has no key metadata, skipping"
            );
            return None;
        };

        match value.parse::<ContentKey>() {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_STORE,
                    bucket = self.bucket,
                    object = name,
                    error = %err,
                    "Object has malformed key metadata, skipping"
                );
                None
            }
        }
    }
}
