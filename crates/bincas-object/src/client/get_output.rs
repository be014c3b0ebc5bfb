//! Result types for [`ObjectStoreClient::get`](super::ObjectStoreClient::get) and
//! [`ObjectStoreClient::head`](super::ObjectStoreClient::head).

use std::collections::HashMap;

use bytes::Bytes;
use object_store::{Attribute, Attributes, ObjectMeta};

/// Result of a successful [`ObjectStoreClient::get`](super::ObjectStoreClient::get) call.
#[derive(Debug)]
pub struct GetOutput {
    /// Raw bytes of the retrieved object.
    pub data: Bytes,
    /// MIME content-type, if the backend provides one.
    pub content_type: Option<String>,
    /// User-defined metadata attached at write time.
    pub metadata: HashMap<String, String>,
    /// Object metadata (size, etag, last_modified, location).
    pub meta: ObjectMeta,
}

/// Result of a successful [`ObjectStoreClient::head`](super::ObjectStoreClient::head) call.
#[derive(Debug, Clone)]
pub struct HeadOutput {
    /// MIME content-type, if the backend provides one.
    pub content_type: Option<String>,
    /// User-defined metadata attached at write time.
    pub metadata: HashMap<String, String>,
    /// Object metadata (size, etag, last_modified, location).
    pub meta: ObjectMeta,
}

pub(super) fn content_type(attributes: &Attributes) -> Option<String> {
    attributes
        .get(&Attribute::ContentType)
        .map(|v| v.to_string())
}

pub(super) fn user_metadata(attributes: &Attributes) -> HashMap<String, String> {
    attributes
        .iter()
        .filter_map(|(attribute, value)| match attribute {
            Attribute::Metadata(name) => Some((name.to_string(), value.to_string())),
            _ => None,
        })
        .collect()
}
