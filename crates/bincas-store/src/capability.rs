//! Capability negotiation for operations the backend cannot honour.

use serde::{Deserialize, Serialize};

/// What the backing bucket supports beyond plain storage.
///
/// Operations covered by a `false` capability are accepted and discarded
/// (logged, never failed), so callers that depend on them should check here
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// `store_mime_type` changes the stored content type.
    pub mutable_mime_type: bool,
    /// `mark_as_used` and `remove_values_unused_longer_than` track usage.
    pub usage_tracking: bool,
}

impl Capabilities {
    /// Capabilities of an object-storage bucket.
    pub const OBJECT_STORAGE: Self = Self {
        mutable_mime_type: false,
        usage_tracking: false,
    };
}
