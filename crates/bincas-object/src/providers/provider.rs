//! Provider trait for connecting a bucket-scoped client.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::client::ObjectStoreClient;
use crate::error::Error;

/// Credentials that name exactly one bucket.
pub trait BucketCredentials: DeserializeOwned + Send + Sync {
    /// Bucket the resulting client is scoped to.
    fn bucket(&self) -> &str;
}

/// Backend that turns [`BucketCredentials`] into an [`ObjectStoreClient`].
///
/// Clients produced here must honour [`PutMode::Create`](object_store::PutMode)
/// so that concurrent writers of the same key resolve to a single object.
pub trait Provider: Sized + Send + 'static {
    /// Strongly-typed credentials for this provider.
    type Credentials: BucketCredentials;

    /// Unique identifier (e.g. "gcs", "s3").
    const ID: &str;

    /// Build a client for the bucket named by `creds`.
    ///
    /// Fails with a connection error when the bucket is blank or the backend
    /// rejects the configuration.
    fn connect(creds: &Self::Credentials) -> impl Future<Output = Result<Self, Error>> + Send;

    /// Unwrap the underlying client.
    fn into_client(self) -> ObjectStoreClient;
}

/// Rejects blank bucket names before a backend builder sees them.
pub(super) fn require_bucket<'a>(
    creds: &'a impl BucketCredentials,
    id: &str,
) -> Result<&'a str, Error> {
    let bucket = creds.bucket().trim();
    if bucket.is_empty() {
        return Err(Error::connection("bucket name is empty", id, false));
    }
    Ok(bucket)
}
