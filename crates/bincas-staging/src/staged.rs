//! Descriptor returned by [`StagingCache::store`](crate::StagingCache::store).

use bincas_core::ContentKey;
use jiff::Timestamp;

/// Content that has been staged locally and keyed.
///
/// The descriptor does not own the bytes; replay them through
/// [`StagingCache::read`](crate::StagingCache::read) or
/// [`StagingCache::open`](crate::StagingCache::open) and release them with
/// [`StagingCache::evict`](crate::StagingCache::evict).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    key: ContentKey,
    size: u64,
    mime_type: String,
    staged_at: Timestamp,
}

impl StagedObject {
    pub(crate) fn new(key: ContentKey, size: u64, mime_type: String, staged_at: Timestamp) -> Self {
        Self {
            key,
            size,
            mime_type,
            staged_at,
        }
    }

    /// Returns the content key.
    #[inline]
    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    /// Returns the size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the detected media type.
    #[inline]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns when the content was first staged.
    #[inline]
    pub fn staged_at(&self) -> Timestamp {
        self.staged_at
    }
}
