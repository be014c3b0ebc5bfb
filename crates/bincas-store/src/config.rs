//! Binary store configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Configuration for the binary store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct BinaryStoreConfig {
    /// Bucket holding the binary objects
    #[cfg_attr(
        feature = "config",
        arg(long = "bucket", env = "BINCAS_BUCKET", default_value = "")
    )]
    #[serde(default)]
    pub bucket: String,
}

impl BinaryStoreConfig {
    /// Create a configuration for the given bucket.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }

    /// Returns `true` when a non-blank bucket identifier is set.
    #[inline]
    pub fn is_configured(&self) -> bool {
        !self.bucket.trim().is_empty()
    }
}
