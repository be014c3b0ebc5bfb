//! Object-storage provider selection.

use anyhow::Context;
use bincas_object::providers::{
    DEFAULT_REGION, GcsCredentials, GcsProvider, Provider, S3Credentials, S3Provider,
};
use bincas_staging::StagingCache;
use bincas_store::{BinaryStore, BinaryStoreConfig};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Supported object-storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(ValueEnum, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Cloud Storage.
    #[default]
    Gcs,
    /// Amazon S3 or any S3-compatible service.
    S3,
}

/// Provider selection and provider-specific settings.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Object-storage backend
    #[arg(long = "provider", env = "BINCAS_PROVIDER", value_enum, default_value_t = ProviderKind::Gcs)]
    pub provider: ProviderKind,

    /// Path to a GCS service account key file (defaults to ambient credentials)
    #[arg(long = "gcs-service-account-key", env = "BINCAS_GCS_SERVICE_ACCOUNT_KEY")]
    pub gcs_service_account_key: Option<String>,

    /// S3 region
    #[arg(long = "s3-region", env = "BINCAS_S3_REGION", default_value = DEFAULT_REGION)]
    pub s3_region: String,

    /// S3 endpoint URL for S3-compatible services
    #[arg(long = "s3-endpoint", env = "BINCAS_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,
}

impl ProviderConfig {
    /// Connects a binary store to the configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket is unset or the backend cannot be
    /// configured.
    pub async fn connect(
        &self,
        config: BinaryStoreConfig,
        staging: StagingCache,
    ) -> anyhow::Result<BinaryStore> {
        match self.provider {
            ProviderKind::Gcs => {
                let mut credentials = GcsCredentials::new(&config.bucket);
                if let Some(path) = &self.gcs_service_account_key {
                    credentials = credentials.with_service_account_key(path);
                }
                connect::<GcsProvider>(config, &credentials, staging).await
            }
            ProviderKind::S3 => {
                let mut credentials = S3Credentials::new(&config.bucket).with_region(&self.s3_region);
                if let Some(endpoint) = &self.s3_endpoint {
                    credentials = credentials.with_endpoint(endpoint);
                }
                connect::<S3Provider>(config, &credentials, staging).await
            }
        }
    }
}

async fn connect<P: Provider>(
    config: BinaryStoreConfig,
    credentials: &P::Credentials,
    staging: StagingCache,
) -> anyhow::Result<BinaryStore> {
    BinaryStore::connect::<P>(config, credentials, staging)
        .await
        .with_context(|| format!("failed to connect to {} bucket", P::ID))
}
