//! Unified object-store client backed by [`object_store::ObjectStore`].
//!
//! [`ObjectStoreClient`] is a thin, cloneable wrapper around
//! `Arc<dyn ObjectStore>` that provides convenience methods for the
//! operations the binary store needs. Reads return `Ok(None)` for missing
//! objects so absence is handled as a value, never as an error. Every public
//! method is instrumented with [`tracing`] for observability.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::{GetOptions, GetResult, ObjectMeta, ObjectStore, PutMode, PutOptions, PutPayload};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use crate::TRACING_TARGET_CLIENT;
use crate::error::{Error, from_object_store};

mod get_output;
mod put_output;

pub use get_output::{GetOutput, HeadOutput};
pub use put_output::{PutAttributes, PutOutput};

/// Streaming reader over an object's content.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Cloneable handle to any [`ObjectStore`] backend (GCS, S3, in-memory, ...).
///
/// All methods accept human-readable string keys and convert them to
/// [`object_store::path::Path`] internally.
#[derive(Clone, Debug)]
pub struct ObjectStoreClient(pub Arc<dyn ObjectStore>);

impl ObjectStoreClient {
    /// Wrap a concrete [`ObjectStore`] implementation.
    pub fn new(store: impl ObjectStore) -> Self {
        Self(Arc::new(store))
    }

    /// List object metadata under `prefix`.
    ///
    /// Returns all matching objects in a single `Vec`. For lazy iteration,
    /// use [`list_stream`](Self::list_stream) instead.
    #[tracing::instrument(name = "object.list", target = TRACING_TARGET_CLIENT, skip(self))]
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, Error> {
        self.list_stream(prefix).try_collect().await
    }

    /// Lazily stream object metadata under `prefix`.
    pub fn list_stream(&self, prefix: &str) -> BoxStream<'_, Result<ObjectMeta, Error>> {
        let prefix = if prefix.is_empty() {
            None
        } else {
            Some(Path::from(prefix))
        };
        self.0.list(prefix.as_ref()).map_err(from_object_store).boxed()
    }

    /// Retrieve the raw bytes, content-type, and metadata stored at `key`.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    #[tracing::instrument(name = "object.get", target = TRACING_TARGET_CLIENT, skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<GetOutput>, Error> {
        let Some(result) = self.get_opts(key, GetOptions::default()).await? else {
            return Ok(None);
        };

        let meta = result.meta.clone();
        let content_type = get_output::content_type(&result.attributes);
        let metadata = get_output::user_metadata(&result.attributes);
        let data = result.bytes().await.map_err(from_object_store)?;
        Ok(Some(GetOutput {
            data,
            content_type,
            metadata,
            meta,
        }))
    }

    /// Open a streaming reader over the object at `key`.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    #[tracing::instrument(name = "object.open", target = TRACING_TARGET_CLIENT, skip(self))]
    pub async fn open(&self, key: &str) -> Result<Option<ObjectReader>, Error> {
        let Some(result) = self.get_opts(key, GetOptions::default()).await? else {
            return Ok(None);
        };

        let stream = result.into_stream().map_err(std::io::Error::other);
        Ok(Some(Box::pin(StreamReader::new(stream))))
    }

    /// Get content-type and user metadata without downloading the body.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    #[tracing::instrument(name = "object.head", target = TRACING_TARGET_CLIENT, skip(self))]
    pub async fn head(&self, key: &str) -> Result<Option<HeadOutput>, Error> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let Some(result) = self.get_opts(key, options).await? else {
            return Ok(None);
        };

        Ok(Some(HeadOutput {
            content_type: get_output::content_type(&result.attributes),
            metadata: get_output::user_metadata(&result.attributes),
            meta: result.meta,
        }))
    }

    /// Check whether an object exists at `key`.
    #[tracing::instrument(name = "object.exists", target = TRACING_TARGET_CLIENT, skip(self))]
    pub async fn exists(&self, key: &str) -> Result<bool, Error> {
        match self.0.head(&Path::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(from_object_store(e)),
        }
    }

    /// Upload `data` to `key`, replacing any existing object.
    pub async fn put(
        &self,
        key: &str,
        data: Bytes,
        attributes: PutAttributes,
    ) -> Result<PutOutput, Error> {
        self.put_opts(key, data, PutMode::Overwrite, attributes)
            .await
    }

    /// Upload `data` to `key` with the specified [`PutMode`].
    ///
    /// With [`PutMode::Create`] an existing object yields an error for which
    /// [`Error::is_already_exists`] is true.
    #[tracing::instrument(
        name = "object.put_opts",
        target = TRACING_TARGET_CLIENT,
        skip(self, data, attributes),
        fields(size = data.len())
    )]
    pub async fn put_opts(
        &self,
        key: &str,
        data: Bytes,
        mode: PutMode,
        attributes: PutAttributes,
    ) -> Result<PutOutput, Error> {
        let path = Path::from(key);
        let payload = PutPayload::from(data);
        let opts = PutOptions {
            mode,
            attributes: attributes.into_attributes(),
            ..Default::default()
        };
        let result = self
            .0
            .put_opts(&path, payload, opts)
            .await
            .map_err(from_object_store)?;
        Ok(result.into())
    }

    /// Delete every object in `keys` using the backend's bulk delete.
    ///
    /// Keys that are already gone are not an error. Returns the number of
    /// keys submitted.
    #[tracing::instrument(
        name = "object.delete_many",
        target = TRACING_TARGET_CLIENT,
        skip_all,
        fields(count)
    )]
    pub async fn delete_many<I>(&self, keys: I) -> Result<usize, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let paths: Vec<Path> = keys.into_iter().map(|k| Path::from(k.as_ref())).collect();
        let count = paths.len();
        tracing::Span::current().record("count", count);
        if count == 0 {
            return Ok(0);
        }

        let locations = futures::stream::iter(paths.into_iter().map(Ok)).boxed();
        let mut results = self.0.delete_stream(locations);
        while let Some(result) = results.next().await {
            match result {
                Ok(path) => {
                    tracing::trace!(target: TRACING_TARGET_CLIENT, key = %path, "Object deleted");
                }
                Err(object_store::Error::NotFound { path, .. }) => {
                    tracing::debug!(target: TRACING_TARGET_CLIENT, key = %path, "Object already absent");
                }
                Err(e) => return Err(from_object_store(e)),
            }
        }

        Ok(count)
    }

    async fn get_opts(&self, key: &str, options: GetOptions) -> Result<Option<GetResult>, Error> {
        match self.0.get_opts(&Path::from(key), options).await {
            Ok(result) => Ok(Some(result)),
            Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(target: TRACING_TARGET_CLIENT, key, "Object not found");
                Ok(None)
            }
            Err(e) => Err(from_object_store(e)),
        }
    }
}
