//! Error types for staging operations.

use bincas_core::ContentKey;

/// Result type for all staging operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for staging operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading the source stream or the staging directory failed.
    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested content is not (or no longer) staged.
    #[error("content '{key}' is not staged")]
    NotStaged { key: ContentKey },
}

impl Error {
    /// Create a not-staged error.
    pub fn not_staged(key: &ContentKey) -> Self {
        Self::NotStaged { key: key.clone() }
    }
}
