//! Google Cloud Storage backend.

use derive_more::Deref;
use object_store::gcp::GoogleCloudStorageBuilder;
use serde::{Deserialize, Serialize};

use super::provider::{BucketCredentials, Provider, require_bucket};
use crate::client::ObjectStoreClient;
use crate::error::Error;

/// Bucket and optional key file for Google Cloud Storage.
///
/// Without a key file, credentials come from the environment
/// (`GOOGLE_SERVICE_ACCOUNT`, application default credentials, ...).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsCredentials {
    pub bucket: String,
    #[serde(default)]
    pub service_account_key: Option<String>,
}

impl GcsCredentials {
    /// Credentials for `bucket` using ambient authentication.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            service_account_key: None,
        }
    }

    /// Authenticate with the service account key file at `path`.
    #[must_use]
    pub fn with_service_account_key(mut self, path: impl Into<String>) -> Self {
        self.service_account_key = Some(path.into());
        self
    }
}

impl BucketCredentials for GcsCredentials {
    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Client bound to one GCS bucket.
///
/// GCS honours create-only writes natively through generation preconditions.
#[derive(Debug, Deref)]
pub struct GcsProvider(ObjectStoreClient);

impl Provider for GcsProvider {
    type Credentials = GcsCredentials;

    const ID: &str = "gcs";

    async fn connect(creds: &Self::Credentials) -> Result<Self, Error> {
        let bucket = require_bucket(creds, Self::ID)?;
        let builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
        let builder = match &creds.service_account_key {
            Some(path) => builder.with_service_account_path(path),
            None => builder,
        };

        let store = builder
            .build()
            .map_err(|e| Error::connection(e.to_string(), Self::ID, false).with_source(e))?;
        tracing::debug!(target: crate::TRACING_TARGET_CLIENT, provider = Self::ID, bucket, "Client built");

        Ok(Self(ObjectStoreClient::new(store)))
    }

    fn into_client(self) -> ObjectStoreClient {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_bucket_is_rejected() {
        let err = GcsProvider::connect(&GcsCredentials::new("  ")).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Connection);
        assert!(!err.is_retryable());
    }
}
