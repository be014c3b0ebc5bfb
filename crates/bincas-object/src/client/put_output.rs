//! Input and result types for [`ObjectStoreClient::put_opts`](super::ObjectStoreClient::put_opts).

use object_store::{Attribute, Attributes};

/// Attributes written alongside an object's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutAttributes {
    /// MIME content-type.
    pub content_type: Option<String>,
    /// User-defined metadata as name/value pairs.
    pub metadata: Vec<(String, String)>,
}

impl PutAttributes {
    /// Set the content-type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a user-defined metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((name.into(), value.into()));
        self
    }

    pub(super) fn into_attributes(self) -> Attributes {
        let mut attributes = Attributes::new();
        if let Some(ct) = self.content_type {
            attributes.insert(Attribute::ContentType, ct.into());
        }
        for (name, value) in self.metadata {
            attributes.insert(Attribute::Metadata(name.into()), value.into());
        }
        attributes
    }
}

/// Result of a successful put operation.
#[derive(Debug)]
pub struct PutOutput {
    /// Unique identifier for the newly created object, if the backend provides one.
    pub e_tag: Option<String>,
    /// A version indicator for the newly created object, if the backend provides one.
    pub version: Option<String>,
}

impl From<object_store::PutResult> for PutOutput {
    fn from(r: object_store::PutResult) -> Self {
        Self {
            e_tag: r.e_tag,
            version: r.version,
        }
    }
}
