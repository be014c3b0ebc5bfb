//! Content-derived object identifier.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Error returned when a string is not a valid [`ContentKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentKeyError {
    /// The input was empty.
    #[error("content key is empty")]
    Empty,

    /// The input was not a hex-encoded byte sequence.
    #[error("content key '{input}' is not valid hex: {reason}")]
    InvalidHex { input: String, reason: String },
}

/// Opaque identifier derived from an object's content.
///
/// Two keys are equal exactly when their bytes are equal. The string form
/// (lowercase hex) is the identifier used in the staging area and as the
/// remote object name, so it must stay stable across releases.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentKey(Bytes);

impl ContentKey {
    /// Wraps raw digest bytes.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Computes the key of an in-memory buffer.
    pub fn digest(data: &[u8]) -> Self {
        let digest: [u8; 32] = Sha256::digest(data).into();
        Self::from_bytes(digest.to_vec())
    }

    /// Parses the hex string form produced by [`Display`](fmt::Display).
    pub fn from_hex(input: &str) -> Result<Self, ContentKeyError> {
        if input.is_empty() {
            return Err(ContentKeyError::Empty);
        }

        hex::decode(input)
            .map(Self::from_bytes)
            .map_err(|e| ContentKeyError::InvalidHex {
                input: input.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Returns the raw key bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<ContentKey> for ContentKey {
    fn as_ref(&self) -> &ContentKey {
        self
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentKey").field(&self.to_string()).finish()
    }
}

impl FromStr for ContentKey {
    type Err = ContentKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ContentKey {
    type Error = ContentKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ContentKey> for String {
    fn from(key: ContentKey) -> Self {
        key.to_string()
    }
}
