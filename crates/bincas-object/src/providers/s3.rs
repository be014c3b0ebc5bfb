//! Amazon S3 and S3-compatible backends (MinIO, R2, ...).

use derive_more::Deref;
use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use serde::{Deserialize, Serialize};

use super::provider::{BucketCredentials, Provider, require_bucket};
use crate::client::ObjectStoreClient;
use crate::error::Error;

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Bucket, region and optional endpoint/static keys for S3.
///
/// Anything left unset falls back to the standard `AWS_*` environment
/// variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Credentials {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Required for non-AWS services, e.g. `http://localhost:9000`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_owned()
}

impl S3Credentials {
    /// Credentials for `bucket` in the default region.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use static keys instead of the environment's credential chain.
    #[must_use]
    pub fn with_static_keys(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    fn builder(&self, bucket: &str) -> AmazonS3Builder {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&self.region)
            .with_conditional_put(S3ConditionalPut::ETagMatch);

        if let Some(endpoint) = &self.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        if let (Some(id), Some(secret)) = (&self.access_key_id, &self.secret_access_key) {
            builder = builder
                .with_access_key_id(id)
                .with_secret_access_key(secret);
        }

        builder
    }
}

impl BucketCredentials for S3Credentials {
    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Client bound to one S3 bucket.
///
/// Create-only writes are sent as conditional puts (`If-None-Match: *`).
#[derive(Debug, Deref)]
pub struct S3Provider(ObjectStoreClient);

impl Provider for S3Provider {
    type Credentials = S3Credentials;

    const ID: &str = "s3";

    async fn connect(creds: &Self::Credentials) -> Result<Self, Error> {
        let bucket = require_bucket(creds, Self::ID)?;
        let store = creds
            .builder(bucket)
            .build()
            .map_err(|e| Error::connection(e.to_string(), Self::ID, false).with_source(e))?;
        tracing::debug!(
            target: crate::TRACING_TARGET_CLIENT,
            provider = Self::ID,
            bucket,
            region = %creds.region,
            endpoint = ?creds.endpoint,
            "Client built"
        );

        Ok(Self(ObjectStoreClient::new(store)))
    }

    fn into_client(self) -> ObjectStoreClient {
        self.0
    }
}
