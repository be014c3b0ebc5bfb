//! Error types for binary store operations.

/// Result type for all binary store operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for binary store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bucket is unset or contradicts the provider credentials; nothing
    /// was sent to the remote store.
    #[error("invalid store configuration: {reason}")]
    Configuration { reason: String },

    /// Staging the incoming stream failed.
    #[error("staging error: {0}")]
    Staging(#[from] bincas_staging::Error),

    /// The remote object store reported a failure.
    #[error("remote store error: {0}")]
    Remote(#[from] bincas_object::Error),

    /// The object does not exist in the bucket.
    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an object not found error.
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Whether the store was used before a bucket was configured.
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
