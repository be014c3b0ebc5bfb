//! Handle returned for stored content.

use bincas_core::ContentKey;
use bincas_object::ObjectReader;

use crate::{BinaryStore, Result};

/// Content that is present in the bucket under [`key`](Self::key).
///
/// Holds a clone of the store so the content, its media type and its
/// extracted text can be reached without threading the store around.
#[derive(Debug, Clone)]
pub struct BinaryHandle {
    store: BinaryStore,
    key: ContentKey,
    size: u64,
}

impl BinaryHandle {
    pub(crate) fn new(store: BinaryStore, key: ContentKey, size: u64) -> Self {
        Self { store, key, size }
    }

    /// Returns the content key.
    #[inline]
    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    /// Returns the content size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the store this handle belongs to.
    #[inline]
    pub fn store(&self) -> &BinaryStore {
        &self.store
    }

    /// Opens a streaming reader over the content.
    pub async fn reader(&self) -> Result<ObjectReader> {
        self.store.get_input_stream(&self.key).await
    }

    /// Returns the stored media type.
    pub async fn mime_type(&self) -> Result<String> {
        self.store.get_stored_mime_type(&self.key).await
    }

    /// Returns the extracted text, or an empty string when none is stored.
    pub async fn extracted_text(&self) -> Result<String> {
        self.store.get_extracted_text(&self.key).await
    }

    /// Stores (or replaces) the extracted text.
    pub async fn store_extracted_text(&self, text: &str) -> Result<()> {
        self.store.store_extracted_text(&self.key, text).await
    }
}

impl AsRef<ContentKey> for BinaryHandle {
    fn as_ref(&self) -> &ContentKey {
        &self.key
    }
}
